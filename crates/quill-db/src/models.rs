/// Database row types; these map directly to SQLite rows.
/// Distinct from quill-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub created_at: String,
}

pub struct PostRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub thumbnail: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}
