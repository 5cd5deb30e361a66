use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{extract::State, http::StatusCode, response::IntoResponse};

use quill_db::Database;
use quill_types::api::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::ApiError;
use crate::extract::Json;
use crate::token;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

/// Argon2id PHC-format hash with a fresh random salt per call.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

/// A malformed stored hash verifies as false. Login treats it exactly like a
/// wrong password, so nothing about the stored state leaks to the caller.
pub fn verify_password(stored: &str, candidate: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.is_empty() || req.email.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "name, email and password required".into(),
        ));
    }

    let password_hash = hash_password(&req.password)?;

    // Duplicate emails are the UNIQUE constraint's problem, not ours: the
    // insert fails and surfaces as a store error.
    let id = {
        let state = state.clone();
        let name = req.name.clone();
        let email = req.email.clone();
        tokio::task::spawn_blocking(move || state.db.create_user(&name, &email, &password_hash))
            .await
            .map_err(ApiError::internal)??
    };

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id,
            name: req.name,
            email: req.email,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Unknown email and bad password answer identically.
    let user = {
        let state = state.clone();
        let email = req.email.clone();
        tokio::task::spawn_blocking(move || state.db.get_user_by_email(&email))
            .await
            .map_err(ApiError::internal)??
            .ok_or(ApiError::Unauthorized("invalid credentials"))?
    };

    if !verify_password(&user.password, &req.password) {
        return Err(ApiError::Unauthorized("invalid credentials"));
    }

    let token = token::issue(&state.jwt_secret, user.id).map_err(ApiError::internal)?;

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("pw123456").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "pw123456"));
        assert!(!verify_password(&hash, "pw1234567"));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("pw123456").unwrap();
        let b = hash_password("pw123456").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("not-a-phc-string", "pw123456"));
        assert!(!verify_password("", "pw123456"));
    }
}
