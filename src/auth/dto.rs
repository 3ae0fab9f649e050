use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for registration (POST /api/auth/).
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub handle: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for requesting a reset email.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Request body for consuming a reset link.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

/// Request body for changing the password of a logged-in user.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Request body for partial profile updates.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub handle: Option<String>,
}

/// Payload returned by register and login: the public identity plus a fresh
/// session token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    pub user_id: Uuid,
    pub handle: String,
    pub email: String,
    pub token: String,
}

/// Payload returned after a consumed password reset.
#[derive(Debug, Serialize)]
pub struct TokenData {
    pub token: String,
}

/// Payload returned by profile updates.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateData {
    pub user_id: Uuid,
    pub handle: String,
}
