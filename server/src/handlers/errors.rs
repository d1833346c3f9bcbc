use thiserror::Error;
use tracing::error;

use shared::types::InputError;

use crate::auth::credentials::CredentialError;
use crate::auth::tokens::TokenError;
use crate::database::StoreError;

/// Failure of a single operation, surfaced in the response `errors` list.
#[derive(Debug, Error)]
pub enum OperationError {
    /// Unknown email or wrong password. The two are not distinguished.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Denied by the declarative rule table.
    #[error("Not Authorised!")]
    NotAuthorised,

    /// Denied by the per-operation guard.
    #[error("Forbidden resource")]
    Forbidden,

    #[error(transparent)]
    BadInput(#[from] InputError),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Email is already registered")]
    DuplicateEmail,

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("internal error: {0:#}")]
    Internal(anyhow::Error),
}

impl OperationError {
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::NotAuthorised => "NOT_AUTHORISED",
            Self::Forbidden => "FORBIDDEN",
            Self::BadInput(e) => e.to_code(),
            Self::InvalidArguments(_) => "BAD_USER_INPUT",
            Self::DuplicateEmail => "DUPLICATE_EMAIL",
            Self::UnknownOperation(_) => "UNKNOWN_OPERATION",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Client-facing message. Internal causes are logged, never returned.
    pub fn to_message(&self) -> String {
        match self {
            Self::Internal(cause) => {
                error!("Operation failed internally: {:#}", cause);
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        }
    }

    /// True for denials from either authorization layer.
    pub fn is_authorization_denial(&self) -> bool {
        matches!(self, Self::NotAuthorised | Self::Forbidden)
    }

    pub fn internal(cause: impl Into<anyhow::Error>) -> Self {
        Self::Internal(cause.into())
    }
}

impl From<StoreError> for OperationError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail(_) => Self::DuplicateEmail,
            other => Self::internal(other),
        }
    }
}

impl From<CredentialError> for OperationError {
    fn from(e: CredentialError) -> Self {
        Self::internal(e)
    }
}

impl From<TokenError> for OperationError {
    fn from(e: TokenError) -> Self {
        Self::internal(e)
    }
}

impl From<serde_json::Error> for OperationError {
    fn from(e: serde_json::Error) -> Self {
        Self::internal(e)
    }
}
