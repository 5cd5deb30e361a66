use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::token;

/// Extract and validate the bearer JWT from the Authorization header, then
/// stash the caller id in request extensions for the [`AuthUser`] extractor.
/// Missing header, wrong shape, and failed verification all stop the request
/// here with 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized("missing Authorization header"))?;

    // Exactly "Bearer <token>"; the scheme is case-insensitive.
    let (scheme, token) = header_value
        .split_once(' ')
        .ok_or(ApiError::Unauthorized("invalid Authorization header"))?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(ApiError::Unauthorized("invalid Authorization header"));
    }

    let user_id = token::verify(&state.jwt_secret, token)
        .map_err(|_| ApiError::Unauthorized("invalid token"))?;

    req.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(req).await)
}
