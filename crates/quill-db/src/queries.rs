use crate::Database;
use crate::models::{PostRow, UserRow};
use anyhow::{Result, anyhow};
use rusqlite::Connection;

impl Database {
    // -- Users --

    /// Insert a user and return the assigned row id. A duplicate email
    /// violates the UNIQUE constraint and surfaces as an error here; the
    /// store owns that invariant, callers do not pre-check.
    pub fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (name, email, password) VALUES (?1, ?2, ?3)",
                (name, email, password_hash),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    // -- Posts --

    /// Insert a post and read the stored row back, picking up the
    /// server-assigned id, status default and timestamps.
    pub fn insert_post(
        &self,
        user_id: i64,
        title: &str,
        content: &str,
        thumbnail: Option<&str>,
        status: &str,
    ) -> Result<PostRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (user_id, title, content, thumbnail, status) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![user_id, title, content, thumbnail, status],
            )?;
            let id = conn.last_insert_rowid();
            query_post(conn, id)?.ok_or_else(|| anyhow!("post {} missing after insert", id))
        })
    }

    pub fn get_post(&self, id: i64) -> Result<Option<PostRow>> {
        self.with_conn(|conn| query_post(conn, id))
    }

    pub fn list_posts(&self) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT {POST_COLUMNS} FROM posts"))?;
            let rows = stmt
                .query_map([], map_post_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Posts owned by one user, newest first. The id tiebreak keeps the
    /// order deterministic when rows share a creation second.
    pub fn list_posts_by_user(&self, user_id: i64) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {POST_COLUMNS} FROM posts
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], map_post_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Owner-scoped update. Returns the affected row count: 0 means the post
    /// does not exist or belongs to someone else, and the caller cannot tell
    /// which.
    pub fn update_post(
        &self,
        id: i64,
        user_id: i64,
        title: &str,
        content: &str,
        thumbnail: Option<&str>,
        status: &str,
    ) -> Result<usize> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "UPDATE posts
                 SET title = ?1, content = ?2, thumbnail = ?3, status = ?4,
                     updated_at = datetime('now')
                 WHERE id = ?5 AND user_id = ?6",
                rusqlite::params![title, content, thumbnail, status, id, user_id],
            )?;
            Ok(affected)
        })
    }

    /// Owner-scoped delete; same zero-row contract as [`Database::update_post`].
    pub fn delete_post(&self, id: i64, user_id: i64) -> Result<usize> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "DELETE FROM posts WHERE id = ?1 AND user_id = ?2",
                rusqlite::params![id, user_id],
            )?;
            Ok(affected)
        })
    }
}

const POST_COLUMNS: &str = "id, user_id, title, content, thumbnail, status, created_at, updated_at";

fn map_post_row(row: &rusqlite::Row) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        thumbnail: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn
        .prepare("SELECT id, name, email, password, role, created_at FROM users WHERE email = ?1")?;

    let row = stmt
        .query_row([email], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                role: row.get(4)?,
                created_at: row.get(5)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_post(conn: &Connection, id: i64) -> Result<Option<PostRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"))?;

    let row = stmt.query_row([id], map_post_row).optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
