use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::state::AppState;

pub mod handlers;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload/avatar", post(handlers::upload_avatar))
        .route("/images", get(handlers::list_images))
        .route("/images/:filename", delete(handlers::delete_image))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}
