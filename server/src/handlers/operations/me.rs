use std::sync::Arc;

use tracing::info;

use crate::auth::context::RequestContext;
use crate::handlers::errors::OperationError;
use crate::handlers::executor::{OperationOutput, OperationResult};

/// The caller's own identity.
pub async fn handle_me(ctx: Arc<RequestContext>) -> OperationResult {
    let user = ctx.session().ok_or(OperationError::Forbidden)?;
    info!("Identity requested by user_id={}", user.id);

    Ok(OperationOutput::value(serde_json::to_value(user)?))
}
