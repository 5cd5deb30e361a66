use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::ApiError;

/// Authenticated caller id, written into request extensions by
/// [`crate::middleware::require_auth`] and read back here. The sole channel
/// by which handlers learn who is calling.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i64);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // An absent or non-positive id counts as unauthenticated, even though
        // the middleware should have blocked the request already.
        match parts.extensions.get::<AuthUser>() {
            Some(user) if user.0 > 0 => Ok(*user),
            _ => Err(ApiError::Unauthorized("unauthorized")),
        }
    }
}

/// `axum::Json` with the rejection collapsed into [`ApiError`], so a
/// malformed or missing body answers 400 rather than axum's stock 422.
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Json(value)),
            Err(_) => Err(ApiError::BadRequest("invalid request payload".into())),
        }
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}
