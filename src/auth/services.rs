use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use regex::Regex;
use tracing::error;
use uuid::Uuid;

use crate::auth::dto::{LoginRequest, RegisterRequest};
use crate::error::FieldErrors;

pub const MAX_NAME_LEN: usize = 100;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Opaque session token handed out at login.
pub fn new_session_token() -> String {
    Uuid::new_v4().to_string()
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!("hash password: {}", e)
        })
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!("parse password hash: {}", e)
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

pub(crate) fn check_username(errors: &mut FieldErrors, username: &str) {
    if username.is_empty() {
        errors.add("username", "The username field is required.");
    } else if username.chars().count() > MAX_NAME_LEN {
        errors.add("username", "The username may not be greater than 100 characters.");
    }
}

pub(crate) fn check_email(errors: &mut FieldErrors, email: &str) {
    if email.is_empty() {
        errors.add("email", "The email field is required.");
    } else if !is_valid_email(email) {
        errors.add("email", "The email must be a valid email address.");
    }
}

pub(crate) fn check_password(errors: &mut FieldErrors, password: &str) {
    if password.is_empty() {
        errors.add("password", "The password field is required.");
    } else if password.chars().count() > MAX_NAME_LEN {
        errors.add("password", "The password may not be greater than 100 characters.");
    }
}

/// Trims and lower-cases the email in place, then reports every invalid field.
pub fn validate_registration(payload: &mut RegisterRequest) -> FieldErrors {
    payload.username = payload.username.trim().to_string();
    payload.email = payload.email.trim().to_lowercase();

    let mut errors = FieldErrors::new();
    check_username(&mut errors, &payload.username);
    check_email(&mut errors, &payload.email);
    check_password(&mut errors, &payload.password);
    errors
}

/// Field error for a UNIQUE constraint on `users` that a concurrent write got to first.
pub fn duplicate_user_field(constraint: &str) -> Option<FieldErrors> {
    if constraint.contains("username") {
        Some(FieldErrors::single("username", "Username already exists"))
    } else if constraint.contains("email") {
        Some(FieldErrors::single("email", "Email already exists"))
    } else {
        None
    }
}

pub fn validate_login(payload: &mut LoginRequest) -> FieldErrors {
    payload.username = payload.username.trim().to_string();

    let mut errors = FieldErrors::new();
    if payload.username.is_empty() {
        errors.add("username", "The username field is required.");
    }
    if payload.password.is_empty() {
        errors.add("password", "The password field is required.");
    }
    errors
}
