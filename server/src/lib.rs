//! User directory server: sessions, credentials and two-layer authorization
//! behind a JSON operation endpoint.

pub mod auth;
pub mod database;
pub mod handlers;
pub mod tower_middle;

use std::sync::Arc;
use std::time::Duration;

use shared::types::AuthConfig;

use crate::auth::{CredentialService, SessionResolver, TokenService};
use crate::database::UserStore;
use crate::handlers::executor::OperationExecutor;
use crate::handlers::operations::build_executor;

/// Session knobs taken from `[auth]` at startup.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub token_ttl: Duration,
    pub cookie_secure: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&AuthConfig::default())
    }
}

impl From<&AuthConfig> for SessionSettings {
    fn from(auth: &AuthConfig) -> Self {
        Self {
            token_ttl: Duration::from_secs(auth.token_ttl_secs().unwrap_or(u64::MAX)),
            cookie_secure: auth.cookie_secure,
        }
    }
}

/// Process-wide collaborators handed to every operation.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub credentials: CredentialService,
    pub tokens: Arc<TokenService>,
    pub sessions: SessionResolver,
    pub settings: SessionSettings,
}

impl AppState {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<TokenService>, settings: SessionSettings) -> Self {
        let sessions = SessionResolver::new(Arc::clone(&tokens), Arc::clone(&users));
        Self {
            users,
            credentials: CredentialService::new(),
            tokens,
            sessions,
            settings,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// State plus the executor requests are dispatched to.
#[derive(Clone)]
pub struct App {
    pub state: AppState,
    pub executor: Arc<dyn OperationExecutor>,
}

impl App {
    /// Default wiring: the operation router behind the shield.
    pub fn new(state: AppState) -> Self {
        let executor = Arc::new(build_executor(state.clone()));
        Self { state, executor }
    }

    pub fn with_executor(state: AppState, executor: Arc<dyn OperationExecutor>) -> Self {
        Self { state, executor }
    }
}
