use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, post, put};

use super::RouterConfig;
use crate::presentation::AppState;
use crate::presentation::http::handlers::posts::{
    add_comment, create_post, delete_comment, delete_post, get_post, like_post, list_posts,
    unlike_post, update_post, upload_photo,
};
use crate::presentation::http::middleware::auth::jwt_auth_middleware;

pub(crate) fn router(state: AppState, config: &RouterConfig) -> Router<AppState> {
    let json = Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/{id}", get(get_post).put(update_post).delete(delete_post))
        .route("/{id}/like", post(like_post))
        .route("/{id}/unlike", post(unlike_post))
        .route("/{id}/comments", post(add_comment))
        .route("/{id}/comments/{comment_id}", delete(delete_comment))
        .layer(DefaultBodyLimit::max(config.json_body_limit_bytes));

    let uploads = Router::new()
        .route("/{id}/photo", put(upload_photo))
        .layer(DefaultBodyLimit::max(config.upload_body_limit_bytes));

    json.merge(uploads)
        .layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}
