use serde::{Deserialize, Deserializer, Serialize};

// -- JWT Claims --

/// JWT claims shared between token issuance (login) and the auth middleware.
/// Canonical definition lives here in quill-types to eliminate duplication.
///
/// `sub` is the numeric user id. Tokens minted by other encoders may carry it
/// as a floating-point JSON number, so deserialization accepts both and
/// normalizes to an integer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(deserialize_with = "numeric_subject")]
    pub sub: i64,
    pub exp: usize,
}

fn numeric_subject<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct SubjectVisitor;

    impl serde::de::Visitor<'_> for SubjectVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a numeric user id")
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(|_| E::custom("user id out of range"))
        }

        fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<i64, E> {
            Ok(v as i64)
        }
    }

    deserializer.deserialize_any(SubjectVisitor)
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i64,
}

// -- Posts --

/// Incoming post fields for create and update. Clients routinely echo the
/// whole post object back on update, so unknown fields are tolerated here.
#[derive(Debug, Deserialize)]
pub struct PostPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub thumbnail: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
