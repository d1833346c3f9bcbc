//! The two authorization layers.
//!
//! [`Shield`] wraps the whole executor and consults a static [`RuleTable`]
//! keyed by operation name. [`AuthGuard`] is attached to individual
//! operations when they are registered on the router. They are wired through
//! different extension points and must each deny an anonymous caller on
//! their own; both delegate to [`session_present`].

pub mod guard;
pub mod shield;

pub use guard::{AuthGuard, Guard};
pub use shield::{RuleTable, Shield, default_rules};

use crate::auth::context::RequestContext;

/// The one capability check both layers share.
pub fn session_present(ctx: &RequestContext) -> bool {
    ctx.session().is_some()
}

/// Access predicate evaluated by the declarative layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Allow,
    IsAuthenticated,
}

impl Rule {
    pub fn evaluate(&self, ctx: &RequestContext) -> bool {
        match self {
            Self::Allow => true,
            Self::IsAuthenticated => session_present(ctx),
        }
    }
}
