use serde::Deserialize;
use thiserror::Error;

use crate::types::user::UserStatus;

/// Upper bound on every free-text input field.
pub const MAX_FIELD_LEN: usize = 255;

// ---------------------------------------------------------------------------
// Input wire types
// ---------------------------------------------------------------------------

/// Arguments of the `createUser` mutation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserData {
    pub email: String,
    pub password: String,
    pub status: UserStatus,
}

/// Arguments of the `signIn` mutation.
#[derive(Debug, Clone, Deserialize)]
pub struct SignInData {
    pub email: String,
    pub password: String,
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("{0} must be a valid email address")]
    InvalidEmail(&'static str),

    #[error("{0} must be at most 255 characters")]
    TooLong(&'static str),

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

impl InputError {
    pub fn to_code(&self) -> &'static str {
        "BAD_USER_INPUT"
    }

    pub fn to_message(&self) -> String {
        self.to_string()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl CreateUserData {
    pub fn validate(&self) -> Result<(), InputError> {
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

impl SignInData {
    pub fn validate(&self) -> Result<(), InputError> {
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

fn validate_email(email: &str) -> Result<(), InputError> {
    if email.chars().count() > MAX_FIELD_LEN {
        return Err(InputError::TooLong("email"));
    }
    if !is_valid_email(email) {
        return Err(InputError::InvalidEmail("email"));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), InputError> {
    if password.is_empty() {
        return Err(InputError::Empty("password"));
    }
    if password.chars().count() > MAX_FIELD_LEN {
        return Err(InputError::TooLong("password"));
    }
    Ok(())
}

/// Structural email check: one `@`, a non-empty local part, and a dotted
/// domain with no empty labels.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}
