use std::sync::Arc;

use hyper::header::HeaderMap;
use tracing::{debug, error, warn};

use shared::types::User;

use crate::auth::tokens::TokenService;
use crate::database::UserStore;
use crate::handlers::http::utils::headers::{get_bearer_token, get_cookie};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "jwt";

/// Pull a candidate token out of the request headers.
///
/// Checks `Authorization: Bearer <token>` first, then the `jwt` cookie. The
/// first present, non-empty source wins.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = get_bearer_token(headers).filter(|t| !t.is_empty()) {
        debug!("Using session token from Bearer header");
        return Some(token);
    }

    if let Some(token) = get_cookie(headers, SESSION_COOKIE).filter(|t| !t.is_empty()) {
        debug!("Using session token from {} cookie", SESSION_COOKIE);
        return Some(token);
    }

    debug!("No session token in Bearer header or {} cookie", SESSION_COOKIE);
    None
}

/// Resolves the raw request into the caller's identity.
#[derive(Clone)]
pub struct SessionResolver {
    tokens: Arc<TokenService>,
    users: Arc<dyn UserStore>,
}

impl SessionResolver {
    pub fn new(tokens: Arc<TokenService>, users: Arc<dyn UserStore>) -> Self {
        Self { tokens, users }
    }

    /// `None` covers every failure: no token, bad token, non-numeric
    /// subject, deleted user, or a store error.
    pub async fn resolve(&self, headers: &HeaderMap) -> Option<User> {
        let token = extract_token(headers)?;
        self.resolve_token(&token).await
    }

    pub async fn resolve_token(&self, token: &str) -> Option<User> {
        let verified = self.tokens.decode(token)?;

        let Some(user_id) = verified.user_id() else {
            warn!("Validly signed token carries a non-numeric subject");
            return None;
        };

        match self.users.find_by_id(user_id).await {
            Ok(Some(user)) => {
                debug!("Session resolved: user_id={}", user.id);
                Some(user)
            }
            Ok(None) => {
                debug!("Token subject {} no longer exists", user_id);
                None
            }
            Err(e) => {
                error!("User lookup failed during session resolution: {}", e);
                None
            }
        }
    }
}
