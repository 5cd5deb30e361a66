use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use quill_db::models::PostRow;
use quill_types::api::{MessageResponse, PostPayload};
use quill_types::models::{Post, PostStatus};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::{AuthUser, Json};

const THUMBNAIL_MAX_LEN: usize = 2048;

/// Post fields that passed validation, ready to store.
struct ValidatedPost {
    title: String,
    content: String,
    thumbnail: Option<String>,
    status: PostStatus,
}

fn validate_post(payload: PostPayload) -> Result<ValidatedPost, ApiError> {
    let title = payload.title.trim().to_string();
    let content = payload.content.trim().to_string();
    if title.is_empty() || content.is_empty() {
        return Err(ApiError::BadRequest("title and content are required".into()));
    }

    let thumbnail = payload.thumbnail.map(|t| t.trim().to_string());
    if let Some(thumb) = &thumbnail {
        if thumb.len() > THUMBNAIL_MAX_LEN {
            return Err(ApiError::BadRequest("thumbnail too long".into()));
        }
    }

    // Blank means draft; anything else must be in the enum.
    let status = match payload.status.as_deref().map(str::trim) {
        None | Some("") => PostStatus::Draft,
        Some(s) => {
            PostStatus::parse(s).ok_or_else(|| ApiError::BadRequest("invalid status".into()))?
        }
    };

    Ok(ValidatedPost {
        title,
        content,
        thumbnail,
        status,
    })
}

fn parse_timestamp(raw: &str, post_id: i64) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without
            // timezone. Parse as naive UTC and convert.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on post {}: {}", raw, post_id, e);
            DateTime::default()
        })
}

fn post_from_row(row: PostRow) -> Post {
    let status = PostStatus::parse(&row.status).unwrap_or_else(|| {
        warn!("Corrupt status '{}' on post {}", row.status, row.id);
        PostStatus::Draft
    });

    Post {
        id: row.id,
        user_id: row.user_id,
        title: row.title,
        content: row.content,
        thumbnail: row.thumbnail,
        status,
        created_at: parse_timestamp(&row.created_at, row.id),
        updated_at: parse_timestamp(&row.updated_at, row.id),
    }
}

pub async fn create_post(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PostPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let post = validate_post(payload)?;

    // Run the blocking DB insert off the async runtime
    let row = tokio::task::spawn_blocking(move || {
        state.db.insert_post(
            user.0,
            &post.title,
            &post.content,
            post.thumbnail.as_deref(),
            post.status.as_str(),
        )
    })
    .await
    .map_err(ApiError::internal)??;

    Ok((StatusCode::CREATED, Json(post_from_row(row))))
}

/// Public listing: every post, every status, no pagination.
pub async fn list_posts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = tokio::task::spawn_blocking(move || state.db.list_posts())
        .await
        .map_err(ApiError::internal)??;

    Ok(Json(
        rows.into_iter().map(post_from_row).collect::<Vec<_>>(),
    ))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let row = tokio::task::spawn_blocking(move || state.db.get_post(id))
        .await
        .map_err(ApiError::internal)??
        .ok_or(ApiError::NotFound("post not found"))?;

    Ok(Json(post_from_row(row)))
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: AuthUser,
    Json(payload): Json<PostPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let post = validate_post(payload)?;

    let affected = tokio::task::spawn_blocking(move || {
        state.db.update_post(
            id,
            user.0,
            &post.title,
            &post.content,
            post.thumbnail.as_deref(),
            post.status.as_str(),
        )
    })
    .await
    .map_err(ApiError::internal)??;

    // Zero rows: absent or someone else's, and the caller cannot tell which.
    if affected == 0 {
        return Err(ApiError::NotFound("post not found or unauthorized"));
    }

    Ok(Json(MessageResponse {
        message: "post updated successfully".into(),
    }))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let affected = tokio::task::spawn_blocking(move || state.db.delete_post(id, user.0))
        .await
        .map_err(ApiError::internal)??;

    if affected == 0 {
        return Err(ApiError::NotFound("post not found or unauthorized"));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// The caller's own posts, newest first.
pub async fn my_posts(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let rows = tokio::task::spawn_blocking(move || state.db.list_posts_by_user(user.0))
        .await
        .map_err(ApiError::internal)??;

    Ok(Json(
        rows.into_iter().map(post_from_row).collect::<Vec<_>>(),
    ))
}
