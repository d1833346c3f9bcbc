use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use shared::types::{SessionClaims, UserId};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("signing secret is empty")]
    EmptySecret,

    #[error("failed to sign token: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
}

/// Process-wide HMAC key. Read once at startup and never mutated.
#[derive(Clone)]
pub struct SigningSecret(String);

impl SigningSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

/// Payload of a token whose signature and expiry have been checked.
///
/// The subject is still untrusted: a token signed with our key may carry any
/// JSON value there, so callers go through [`VerifiedToken::user_id`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VerifiedToken {
    #[serde(default)]
    sub: Value,
    exp: u64,
    #[serde(default)]
    iat: Option<u64>,
}

impl VerifiedToken {
    /// The subject as a user id, if it is a positive integer or a decimal
    /// string of one.
    pub fn user_id(&self) -> Option<UserId> {
        let id = match &self.sub {
            Value::Number(n) => n.as_i64(),
            Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
                s.parse::<i64>().ok()
            }
            _ => None,
        }?;

        (id > 0).then_some(UserId::new(id))
    }

    pub fn expires_at(&self) -> u64 {
        self.exp
    }

    pub fn issued_at(&self) -> Option<u64> {
        self.iat
    }
}

/// Issues and verifies HS256 session tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &Algorithm::HS256)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &SigningSecret) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }

        // Expiry is checked by hand in `decode_at` against the caller's clock,
        // with no leeway. Only `exp` must be present: the library reads `sub`
        // as a string, and `VerifiedToken::user_id` checks its shape instead.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Sign a token for `subject` that expires `ttl` from now.
    pub fn issue(&self, subject: UserId, ttl: Duration) -> Result<String, TokenError> {
        self.issue_at(subject, ttl, now_secs())
    }

    /// Sign a token as if the current time were `now` (Unix seconds).
    pub fn issue_at(&self, subject: UserId, ttl: Duration, now: u64) -> Result<String, TokenError> {
        let claims = SessionClaims::new(subject, now, now.saturating_add(ttl.as_secs()));
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Verify signature and expiry against the current time.
    ///
    /// Any failure yields `None`; an invalid token just means no session.
    pub fn decode(&self, token: &str) -> Option<VerifiedToken> {
        self.decode_at(token, now_secs())
    }

    /// Verify signature and expiry as if the current time were `now`.
    pub fn decode_at(&self, token: &str, now: u64) -> Option<VerifiedToken> {
        let data = match decode::<VerifiedToken>(token, &self.decoding_key, &self.validation) {
            Ok(data) => data,
            Err(e) => {
                debug!("Rejected session token: {:?}", e.kind());
                return None;
            }
        };

        if now >= data.claims.exp {
            debug!("Rejected session token: expired at {}", data.claims.exp);
            return None;
        }

        Some(data.claims)
    }
}

/// Current Unix timestamp in seconds.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
