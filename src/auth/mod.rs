use axum::{
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod reset;
pub mod validate;

/// Routes nested under `/api/auth`. Registration sits on the bare prefix.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/forgot-password", post(handlers::forgot_password))
        .route("/reset-password/:reset_token", post(handlers::reset_password))
        .route(
            "/profile",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        .route("/change-password", put(handlers::change_password))
        .route("/logout", post(handlers::logout))
}
