use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::auth::context::RequestContext;
use crate::handlers::executor::{CookieDirective, OperationOutput, OperationResult};

/// Ask the client to drop its session cookie.
///
/// The token itself is not revoked and stays valid until it expires; there
/// is no server-side session to destroy.
pub async fn handle_sign_out(ctx: Arc<RequestContext>) -> OperationResult {
    if let Some(user) = ctx.session() {
        info!("User signed out: user_id={}", user.id);
    }

    Ok(OperationOutput::value(Value::Bool(true)).with_cookie(CookieDirective::ClearSession))
}
