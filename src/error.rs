use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::error;

/// Response envelope shared by every endpoint: `{code, message, data}`.
/// `code` mirrors the HTTP status so clients reading only the body still
/// see the outcome.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub code: u16,
    pub message: String,
    pub data: Option<T>,
}

/// Wraps a success payload in the envelope.
pub fn reply<T: Serialize>(
    status: StatusCode,
    message: &str,
    data: Option<T>,
) -> (StatusCode, Json<Envelope<T>>) {
    (
        status,
        Json(Envelope {
            code: status.as_u16(),
            message: message.to_string(),
            data,
        }),
    )
}

/// Envelope with `data: null`, for acknowledgment-only endpoints.
pub fn reply_empty(status: StatusCode, message: &str) -> (StatusCode, Json<Envelope<()>>) {
    reply::<()>(status, message, None)
}

/// Per-field message attached to a validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn is_production() -> bool {
    std::env::var("APP_ENV")
        .map(|v| v == "production")
        .unwrap_or(false)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, data) = match &self {
            ApiError::Validation(errors) => (
                "validation failed".to_string(),
                Some(json!({ "errors": errors })),
            ),
            ApiError::Internal(cause) => {
                error!(error = ?cause, "internal error");
                // Cause details stay out of production responses.
                let message = if is_production() {
                    "server error".to_string()
                } else {
                    format!("server error: {cause}")
                };
                (message, None)
            }
            other => (other.to_string(), None),
        };
        let body = Envelope {
            code: status.as_u16(),
            message,
            data,
        };
        (status, Json(body)).into_response()
    }
}

/// `Json<T>` whose rejection is rendered in the envelope like every other
/// request error, instead of axum's bare text body.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}
