use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::{info, instrument};

use crate::{
    auth::extractors::{AdminUser, CurrentUser},
    error::{reply, reply_empty, ApiError, Envelope},
    images::services::{content_type_for, is_allowed_image, sanitize_filename},
    state::AppState,
};

type Reply<T> = Result<(StatusCode, Json<Envelope<T>>), ApiError>;

/// Payload for a stored avatar.
#[derive(Debug, Serialize)]
pub struct UploadData {
    pub filename: String,
    pub path: String,
}

/// POST /upload/avatar (multipart, field `avatar`). The upload keeps its
/// client-side filename, so a re-upload of the same name overwrites.
#[instrument(skip(state, user, multipart))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Reply<UploadData> {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("avatar") {
            continue;
        }

        let Some(filename) = field.file_name().and_then(sanitize_filename) else {
            return Err(ApiError::BadRequest("invalid file name".into()));
        };
        if !is_allowed_image(&filename) {
            return Err(ApiError::BadRequest(
                "only jpg, jpeg, png and gif files are allowed".into(),
            ));
        }

        let body = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        state
            .files
            .save(&filename, body, content_type_for(&filename))
            .await?;

        info!(user_id = %user.id, filename = %filename, "avatar uploaded");
        return Ok(reply(
            StatusCode::OK,
            "avatar uploaded",
            Some(UploadData {
                path: format!("/images/{filename}"),
                filename,
            }),
        ));
    }

    Err(ApiError::BadRequest("no file uploaded".into()))
}

/// GET /images: names currently in the store, image extensions only.
#[instrument(skip(state))]
pub async fn list_images(State(state): State<AppState>) -> Reply<Vec<String>> {
    let names = state.files.list().await?;
    let images: Vec<String> = names.into_iter().filter(|n| is_allowed_image(n)).collect();
    Ok(reply(StatusCode::OK, "images fetched", Some(images)))
}

/// DELETE /images/:filename, admin only. Deleting an absent file still
/// reports success.
#[instrument(skip(state, admin))]
pub async fn delete_image(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(filename): Path<String>,
) -> Reply<()> {
    let Some(filename) = sanitize_filename(&filename) else {
        return Err(ApiError::BadRequest("invalid file name".into()));
    };

    state.files.delete(&filename).await?;

    info!(admin_id = %admin.id, filename = %filename, "image deleted");
    Ok(reply_empty(StatusCode::OK, "image deleted"))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::app::build_app;
    use crate::state::AppState;

    #[tokio::test]
    async fn listing_is_public_and_filters_non_images() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(
                Request::builder()
                    .uri("/api/images")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        // The fake store holds sample.png and notes.txt; only the image survives.
        assert_eq!(body["data"], serde_json::json!(["sample.png"]));
    }

    #[tokio::test]
    async fn upload_requires_a_session() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/upload/avatar")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn delete_requires_a_session() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/images/sample.png")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
