use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{ApiError, FieldError};

pub const HANDLE_MIN: usize = 3;
pub const HANDLE_MAX: usize = 20;
pub const PASSWORD_MIN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn check_handle(errors: &mut Vec<FieldError>, handle: &str) {
    let len = handle.chars().count();
    if len < HANDLE_MIN || len > HANDLE_MAX {
        errors.push(FieldError::new(
            "handle",
            format!("handle must be {HANDLE_MIN}-{HANDLE_MAX} characters"),
        ));
    }
}

fn check_email(errors: &mut Vec<FieldError>, email: &str) {
    if !is_valid_email(email) {
        errors.push(FieldError::new("email", "a valid email address is required"));
    }
}

fn check_password_length(errors: &mut Vec<FieldError>, field: &'static str, password: &str) {
    if password.chars().count() < PASSWORD_MIN {
        errors.push(FieldError::new(
            field,
            format!("password must be at least {PASSWORD_MIN} characters"),
        ));
    }
}

/// Replacement passwords (reset, change) also require a digit; the original
/// password chosen at registration does not.
fn check_password_digit(errors: &mut Vec<FieldError>, field: &'static str, password: &str) {
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push(FieldError::new(field, "password must contain a digit"));
    }
}

fn result(errors: Vec<FieldError>) -> Result<(), ApiError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

pub fn register(handle: &str, email: &str, password: &str) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    check_handle(&mut errors, handle);
    check_email(&mut errors, email);
    check_password_length(&mut errors, "password", password);
    result(errors)
}

pub fn login(email: &str, password: &str) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    check_email(&mut errors, email);
    if password.is_empty() {
        errors.push(FieldError::new("password", "password is required"));
    }
    result(errors)
}

pub fn forgot_password(email: &str) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    check_email(&mut errors, email);
    result(errors)
}

pub fn reset_password(new_password: &str) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    check_password_length(&mut errors, "newPassword", new_password);
    check_password_digit(&mut errors, "newPassword", new_password);
    result(errors)
}

pub fn change_password(current_password: &str, new_password: &str) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    if current_password.is_empty() {
        errors.push(FieldError::new(
            "currentPassword",
            "current password is required",
        ));
    }
    check_password_length(&mut errors, "newPassword", new_password);
    check_password_digit(&mut errors, "newPassword", new_password);
    result(errors)
}

/// Profile updates are partial; only fields that are present get checked.
pub fn update_profile(handle: Option<&str>) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    if let Some(handle) = handle {
        check_handle(&mut errors, handle);
    }
    result(errors)
}
