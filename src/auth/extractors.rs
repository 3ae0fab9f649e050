use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::jwt::SessionKeys;
use crate::auth::repo::{Role, User};
use crate::error::ApiError;
use crate::state::AppState;

/// Bearer-token gate: resolves the session to its user or rejects with 401.
/// The row is fetched without the password hash.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing authorization header".into()))?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| ApiError::Unauthorized("invalid auth scheme".into()))?;

        let keys = SessionKeys::from_ref(state);
        let Some(claims) = keys.verify(token) else {
            warn!("invalid or expired session token");
            return Err(ApiError::Unauthorized("invalid or expired token".into()));
        };

        // A valid token can outlive its account.
        let user = User::find_by_id(&state.db, claims.sub, false)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("user not found".into()))?;

        Ok(CurrentUser(user))
    }
}

/// Admin gate layered on the bearer gate: authenticated but non-admin
/// callers get 403.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            warn!(user_id = %user.id, "admin route refused");
            return Err(ApiError::Forbidden("admin access required".into()));
        }
        Ok(AdminUser(user))
    }
}
