use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use shared::types::{SignInData, User};

use crate::AppState;
use crate::auth::credentials::CredentialError;
use crate::handlers::errors::OperationError;
use crate::handlers::executor::{CookieDirective, OperationOutput, OperationResult};
use crate::handlers::operations::data_argument;

#[derive(Debug, Serialize)]
pub struct SignInPayload {
    pub token: String,
    pub user: User,
}

/// Exchange email + password for a session token.
pub async fn handle_sign_in(state: AppState, args: Value) -> OperationResult {
    let data: SignInData = data_argument(args)?;
    data.validate()?;

    info!("Attempting sign-in for: {}", data.email);

    let user = state
        .users
        .find_by_email(&data.email)
        .await?
        .ok_or_else(|| {
            warn!("Sign-in failed: no account for {}", data.email);
            OperationError::InvalidCredentials
        })?;

    let valid = state
        .credentials
        .verify_async(data.password, user.password_hash.clone())
        .await
        .map_err(|e| {
            if let CredentialError::MalformedHash(_) = e {
                error!("Stored password hash for user_id={} is corrupt", user.id);
            }
            OperationError::from(e)
        })?;

    if !valid {
        warn!("Sign-in failed: wrong password for user_id={}", user.id);
        return Err(OperationError::InvalidCredentials);
    }

    let token = state.tokens.issue(user.id, state.settings.token_ttl)?;

    info!("User signed in: user_id={}", user.id);

    let payload = SignInPayload {
        token: token.clone(),
        user,
    };

    Ok(OperationOutput::value(serde_json::to_value(payload)?)
        .with_cookie(CookieDirective::SetSession(token)))
}
