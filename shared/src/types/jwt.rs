use serde::{Deserialize, Serialize};

use crate::types::user::UserId;

/// Claims embedded in every session token issued by the server.
///
/// Tokens are stateless: nothing about them is stored server-side, so a token
/// stays valid until `exp` even after the client has signed out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Standard JWT subject, the decimal form of the user id.
    pub sub: String,

    /// Issued-at (Unix timestamp, seconds).
    pub iat: u64,

    /// Standard JWT expiry (Unix timestamp, seconds).
    pub exp: u64,
}

impl SessionClaims {
    pub fn new(subject: UserId, issued_at: u64, expires_at: u64) -> Self {
        Self {
            sub: subject.to_string(),
            iat: issued_at,
            exp: expires_at,
        }
    }
}
