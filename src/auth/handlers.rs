use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    Json,
};
use time::{Duration, OffsetDateTime};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthData, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest,
            ProfileUpdateData, RegisterRequest, ResetPasswordRequest, TokenData,
            UpdateProfileRequest,
        },
        extractors::CurrentUser,
        jwt::SessionKeys,
        repo::{is_unique_violation, User},
        reset::{self, RESET_TTL_MINUTES},
        validate,
    },
    error::{reply, reply_empty, ApiError, ApiJson, Envelope},
    state::AppState,
};

type Reply<T> = Result<(StatusCode, Json<Envelope<T>>), ApiError>;

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(mut payload): ApiJson<RegisterRequest>,
) -> Reply<AuthData> {
    payload.handle = payload.handle.trim().to_string();
    payload.email = payload.email.trim().to_lowercase();
    validate::register(&payload.handle, &payload.email, &payload.password)?;

    // Uniqueness pre-check on both identity columns. The insert below still
    // maps a racing duplicate to the same conflict.
    for value in [&payload.email, &payload.handle] {
        if User::find_by_email_or_handle(&state.db, value).await?.is_some() {
            warn!(value = %value, "registration conflict");
            return Err(ApiError::Conflict(
                "handle or email is already registered".into(),
            ));
        }
    }

    let user =
        match User::create(&state.db, &payload.handle, &payload.email, &payload.password).await {
            Ok(user) => user,
            Err(e) if is_unique_violation(&e) => {
                warn!("registration lost uniqueness race");
                return Err(ApiError::Conflict(
                    "handle or email is already registered".into(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

    let token = SessionKeys::from_ref(&state).issue(user.id)?;

    info!(user_id = %user.id, handle = %user.handle, "user registered");
    Ok(reply(
        StatusCode::CREATED,
        "user registered",
        Some(AuthData {
            user_id: user.id,
            handle: user.handle,
            email: user.email,
            token,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(mut payload): ApiJson<LoginRequest>,
) -> Reply<AuthData> {
    payload.email = payload.email.trim().to_lowercase();
    validate::login(&payload.email, &payload.password)?;

    // Unknown email and wrong password fail identically.
    let user = User::find_by_email(&state.db, &payload.email, true)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid email or password".into()))?;

    if !user.verify_password(&payload.password)? {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(ApiError::Unauthorized("invalid email or password".into()));
    }

    let token = SessionKeys::from_ref(&state).issue(user.id)?;

    info!(user_id = %user.id, "user logged in");
    Ok(reply(
        StatusCode::OK,
        "login successful",
        Some(AuthData {
            user_id: user.id,
            handle: user.handle,
            email: user.email,
            token,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(mut payload): ApiJson<ForgotPasswordRequest>,
) -> Reply<()> {
    payload.email = payload.email.trim().to_lowercase();
    validate::forgot_password(&payload.email)?;

    let user = User::find_by_email(&state.db, &payload.email, false)
        .await?
        .ok_or_else(|| ApiError::NotFound("no account with that email".into()))?;

    let (secret, secret_hash) = reset::issue_secret();
    let expires_at = OffsetDateTime::now_utc() + Duration::minutes(RESET_TTL_MINUTES);
    User::set_reset_token(&state.db, user.id, &secret_hash, expires_at).await?;

    // The token row is already committed. If the mail bounces the client
    // sees 500, and the row quietly expires on its own.
    let reset_url = format!(
        "{}/reset-password/{}",
        state.config.public_base_url.trim_end_matches('/'),
        secret
    );
    state
        .mailer
        .send(
            &user.email,
            "Password reset request",
            &reset::reset_message(&reset_url),
        )
        .await?;

    info!(user_id = %user.id, "password reset email dispatched");
    Ok(reply_empty(StatusCode::OK, "password reset email sent"))
}

// The path segment is the plaintext secret; keep it out of the span.
#[instrument(skip(state, reset_token, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(reset_token): Path<String>,
    ApiJson(payload): ApiJson<ResetPasswordRequest>,
) -> Reply<TokenData> {
    validate::reset_password(&payload.new_password)?;

    // The URL carries the plaintext; the database only knows the digest.
    let secret_hash = reset::hash_secret(&reset_token);
    let user = User::find_by_reset_hash(&state.db, &secret_hash)
        .await?
        .ok_or_else(|| ApiError::BadRequest("invalid or expired reset token".into()))?;

    User::reset_password(&state.db, user.id, &payload.new_password).await?;
    let token = SessionKeys::from_ref(&state).issue(user.id)?;

    info!(user_id = %user.id, "password reset completed");
    Ok(reply(
        StatusCode::OK,
        "password reset successful",
        Some(TokenData { token }),
    ))
}

#[instrument(skip(state, user, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> Reply<()> {
    validate::change_password(&payload.current_password, &payload.new_password)?;

    // The gate fetched the row without the hash; reload it for verification.
    let user = User::find_by_id(&state.db, user.id, true)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("user not found".into()))?;

    if !user.verify_password(&payload.current_password)? {
        warn!(user_id = %user.id, "change-password with wrong current password");
        return Err(ApiError::Unauthorized("current password is incorrect".into()));
    }

    User::set_password(&state.db, user.id, &payload.new_password).await?;

    info!(user_id = %user.id, "password changed");
    Ok(reply_empty(StatusCode::OK, "password changed"))
}

#[instrument(skip(user))]
pub async fn get_profile(CurrentUser(user): CurrentUser) -> Reply<User> {
    Ok(reply(StatusCode::OK, "profile fetched", Some(user)))
}

#[instrument(skip(state, user, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> Reply<ProfileUpdateData> {
    let handle = payload.handle.as_deref().map(str::trim);
    validate::update_profile(handle)?;

    let handle = match handle {
        Some(handle) => {
            User::update_handle(&state.db, user.id, handle).await?;
            handle.to_string()
        }
        None => user.handle,
    };

    info!(user_id = %user.id, handle = %handle, "profile updated");
    Ok(reply(
        StatusCode::OK,
        "profile updated",
        Some(ProfileUpdateData {
            user_id: user.id,
            handle,
        }),
    ))
}

/// Sessions are stateless, so logout is an acknowledgment; the client
/// discards its token.
#[instrument(skip(user))]
pub async fn logout(CurrentUser(user): CurrentUser) -> Reply<()> {
    info!(user_id = %user.id, "user logged out");
    Ok(reply_empty(StatusCode::OK, "logged out"))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::app::build_app;
    use crate::state::AppState;

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(res: axum::response::Response) -> serde_json::Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    // Validation runs before any database access, so these requests complete
    // against the fake state.

    #[tokio::test]
    async fn register_rejects_invalid_payload_with_field_errors() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(post_json(
                "/api/auth/",
                serde_json::json!({"handle": "ab", "email": "nope", "password": "x"}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let body = body_json(res).await;
        assert_eq!(body["code"], 400);
        assert_eq!(body["message"], "validation failed");
        let errors = body["data"]["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 3);
    }

    #[tokio::test]
    async fn register_rejects_non_json_bodies() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let body = body_json(res).await;
        assert_eq!(body["code"], 400);
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn login_requires_a_password() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(post_json(
                "/api/auth/login",
                serde_json::json!({"email": "a@b.co", "password": ""}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let body = body_json(res).await;
        assert_eq!(body["data"]["errors"][0]["field"], "password");
    }

    #[tokio::test]
    async fn forgot_password_rejects_malformed_email() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(post_json(
                "/api/auth/forgot-password",
                serde_json::json!({"email": "not-an-email"}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reset_password_requires_a_digit() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(post_json(
                "/api/auth/reset-password/deadbeef",
                serde_json::json!({"newPassword": "abcdef"}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let body = body_json(res).await;
        assert_eq!(body["data"]["errors"][0]["field"], "newPassword");
    }

    #[tokio::test]
    async fn change_password_requires_a_session() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/auth/change-password")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({"currentPassword": "a", "newPassword": "b1cdef"})
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_requires_a_session() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/logout")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
