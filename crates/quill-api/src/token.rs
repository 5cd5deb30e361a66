use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use quill_types::api::Claims;

/// Session lifetime. There is no refresh path; clients re-authenticate
/// after expiry.
const TOKEN_TTL_HOURS: i64 = 24;

/// Sign a session token for `user_id`, HS256 over the process-wide secret.
pub fn issue(secret: &str, user_id: i64) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user_id,
        exp: (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Validate a bearer token and return its subject id.
///
/// Only HS256 is accepted: a token claiming any other algorithm (including
/// `none`) fails before its signature is even looked at. Expiry is enforced
/// with zero leeway, and the subject is normalized from either integer or
/// float encoding by the `Claims` deserializer.
pub fn verify(secret: &str, token: &str) -> Result<i64, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;

    Ok(data.claims.sub)
}
