use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::posts;

/// Assemble the HTTP surface: public routes first, then the owner-scoped
/// routes behind the bearer-auth middleware. Wrong-method requests on a known
/// path get 405 from the router itself.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/posts", get(posts::list_posts))
        .route("/posts/{id}", get(posts::get_post));

    let protected = Router::new()
        .route("/posts", post(posts::create_post))
        .route("/posts/{id}", put(posts::update_post).delete(posts::delete_post))
        .route("/my-posts", get(posts::my_posts))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new().merge(public).merge(protected).with_state(state)
}
