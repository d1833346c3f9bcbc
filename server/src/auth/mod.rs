//! Authentication and authorization core.
//!
//! Per request: [`SessionResolver`] turns the raw headers into an
//! `Option<User>`, which is frozen into a [`RequestContext`]. The two gate
//! layers ([`gate::Shield`] and [`gate::AuthGuard`]) both read that context.
//! [`CredentialService`] and [`TokenService`] are only used directly by the
//! sign-up and sign-in operations.

pub mod context;
pub mod credentials;
pub mod gate;
pub mod session;
pub mod tokens;

pub use context::{AuthStatus, RequestContext};
pub use credentials::{CredentialError, CredentialService};
pub use gate::{AuthGuard, Guard, Rule, RuleTable, Shield, session_present};
pub use session::{SESSION_COOKIE, SessionResolver, extract_token};
pub use tokens::{SigningSecret, TokenError, TokenService, VerifiedToken};
