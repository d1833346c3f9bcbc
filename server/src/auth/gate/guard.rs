use crate::auth::context::RequestContext;
use crate::auth::gate::session_present;

/// Per-operation check run by the router right before the handler body.
pub trait Guard: Send + Sync {
    fn name(&self) -> &'static str;

    fn can_activate(&self, ctx: &RequestContext) -> bool;
}

/// Lets the operation through only when the request carries a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthGuard;

impl Guard for AuthGuard {
    fn name(&self) -> &'static str {
        "AuthGuard"
    }

    fn can_activate(&self, ctx: &RequestContext) -> bool {
        session_present(ctx)
    }
}
