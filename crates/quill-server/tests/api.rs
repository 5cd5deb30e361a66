//! End-to-end tests driving the assembled router against an in-memory store.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use quill_api::auth::AppStateInner;
use quill_api::token;
use quill_db::Database;

const SECRET: &str = "test-secret";
const PASSWORD: &str = "pw123456";

fn app() -> Router {
    let db = Database::open_in_memory().unwrap();
    quill_api::router(Arc::new(AppStateInner {
        db,
        jwt_secret: SECRET.into(),
    }))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

async fn register(app: &Router, name: &str, email: &str) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/register",
        None,
        Some(json!({"name": name, "email": email, "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

async fn login(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/login",
        None,
        Some(json!({"email": email, "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn create_post(app: &Router, token: &str, title: &str, status_field: Value) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/posts",
        Some(token),
        Some(json!({"title": title, "content": "Content", "status": status_field})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn register_creates_user() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/register",
        None,
        Some(json!({"name": "A", "email": "a@x.com", "password": PASSWORD})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].as_i64().unwrap() >= 1);
    assert_eq!(body["name"], "A");
    assert_eq!(body["email"], "a@x.com");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn register_rejects_missing_fields() {
    let app = app();
    let (status, _) = send(
        &app,
        "POST",
        "/register",
        None,
        Some(json!({"name": "A", "email": "a@x.com", "password": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method("POST")
        .uri("/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_email_never_registers_twice() {
    let app = app();
    register(&app, "A", "a@x.com").await;

    let (status, _) = send(
        &app,
        "POST",
        "/register",
        None,
        Some(json!({"name": "B", "email": "a@x.com", "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn login_token_subject_is_registered_id() {
    let app = app();
    let id = register(&app, "A", "a@x.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({"email": "a@x.com", "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"].as_i64().unwrap(), id);

    let subject = token::verify(SECRET, body["token"].as_str().unwrap()).unwrap();
    assert_eq!(subject, id);
}

#[tokio::test]
async fn login_rejects_bad_credentials_identically() {
    let app = app();
    register(&app, "A", "a@x.com").await;

    let (unknown_status, unknown_body) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({"email": "nobody@x.com", "password": PASSWORD})),
    )
    .await;
    let (wrong_status, wrong_body) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({"email": "a@x.com", "password": "wrong-password"})),
    )
    .await;

    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    // No existence leak: both paths answer with the same body.
    assert_eq!(unknown_body, wrong_body);
}

#[tokio::test]
async fn protected_routes_require_bearer_token() {
    let app = app();
    let post_body = json!({"title": "T", "content": "C"});

    let (status, _) = send(&app, "POST", "/posts", None, Some(post_body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "POST", "/posts", Some("garbage"), Some(post_body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Token signed with a different secret
    let forged = token::issue("other-secret", 1).unwrap();
    let (status, _) = send(&app, "POST", "/posts", Some(&forged), Some(post_body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Wrong scheme
    let request = Request::builder()
        .method("POST")
        .uri("/posts")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwdw==")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(post_body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bearer_scheme_is_case_insensitive() {
    let app = app();
    register(&app, "A", "a@x.com").await;
    let token = login(&app, "a@x.com").await;

    for scheme in ["bearer", "BEARER", "Bearer"] {
        let request = Request::builder()
            .method("GET")
            .uri("/my-posts")
            .header(header::AUTHORIZATION, format!("{scheme} {token}"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn create_post_validates_fields() {
    let app = app();
    register(&app, "A", "a@x.com").await;
    let token = login(&app, "a@x.com").await;

    let (status, _) = send(
        &app,
        "POST",
        "/posts",
        Some(&token),
        Some(json!({"title": "   ", "content": "C"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/posts",
        Some(&token),
        Some(json!({"title": "T", "content": "C", "thumbnail": "x".repeat(2049)})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/posts",
        Some(&token),
        Some(json!({"title": "T", "content": "C", "status": "archived"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_login_create_flow() {
    let app = app();
    let id = register(&app, "A", "a@x.com").await;
    let token = login(&app, "a@x.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/posts",
        Some(&token),
        Some(json!({"title": "T", "content": "C"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "draft");
    assert_eq!(body["user_id"].as_i64().unwrap(), id);
    assert!(body.get("thumbnail").is_none());

    let post_id = body["id"].as_i64().unwrap();
    let (status, body) = send(&app, "GET", &format!("/posts/{post_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "T");
}

#[tokio::test]
async fn missing_post_is_not_found() {
    let app = app();
    let (status, body) = send(&app, "GET", "/posts/999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "post not found");
}

#[tokio::test]
async fn mutations_scoped_to_owner() {
    let app = app();
    register(&app, "A", "a@x.com").await;
    register(&app, "B", "b@x.com").await;
    let token_a = login(&app, "a@x.com").await;
    let token_b = login(&app, "b@x.com").await;

    let post_id = create_post(&app, &token_a, "Mine", Value::Null).await;
    let update = json!({"title": "Taken over", "content": "C"});

    // B cannot touch A's post; the response does not reveal it exists.
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/posts/{post_id}"),
        Some(&token_b),
        Some(update.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "post not found or unauthorized");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/posts/{post_id}"),
        Some(&token_b),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Stored row unchanged
    let (_, body) = send(&app, "GET", &format!("/posts/{post_id}"), None, None).await;
    assert_eq!(body["title"], "Mine");

    // The owner can
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/posts/{post_id}"),
        Some(&token_a),
        Some(update),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "post updated successfully");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/posts/{post_id}"),
        Some(&token_a),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/posts/{post_id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn public_listing_shows_every_status() {
    let app = app();
    register(&app, "A", "a@x.com").await;
    let token = login(&app, "a@x.com").await;

    create_post(&app, &token, "Draft post", Value::Null).await;
    create_post(&app, &token, "Published post", json!("published")).await;

    // No auth on the public listing, and no implicit status filter.
    let (status, body) = send(&app, "GET", "/posts", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let posts = body.as_array().unwrap();
    assert_eq!(posts.len(), 2);
}

#[tokio::test]
async fn my_posts_filtered_and_newest_first() {
    let app = app();
    register(&app, "A", "a@x.com").await;
    register(&app, "B", "b@x.com").await;
    let token_a = login(&app, "a@x.com").await;
    let token_b = login(&app, "b@x.com").await;

    let first = create_post(&app, &token_a, "First", Value::Null).await;
    let second = create_post(&app, &token_a, "Second", Value::Null).await;
    create_post(&app, &token_b, "Not mine", Value::Null).await;

    let (status, body) = send(&app, "GET", "/my-posts", Some(&token_a), None).await;
    assert_eq!(status, StatusCode::OK);
    let posts = body.as_array().unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0]["id"].as_i64().unwrap(), second);
    assert_eq!(posts[1]["id"].as_i64().unwrap(), first);
}

#[tokio::test]
async fn wrong_method_is_method_not_allowed() {
    let app = app();
    let (status, _) = send(&app, "DELETE", "/register", None, None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn update_with_malformed_body_is_bad_request() {
    let app = app();
    register(&app, "A", "a@x.com").await;
    let token = login(&app, "a@x.com").await;
    let post_id = create_post(&app, &token, "Mine", Value::Null).await;

    let request = Request::builder()
        .method("PUT")
        .uri(format!("/posts/{post_id}"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{broken"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
