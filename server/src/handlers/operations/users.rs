use serde_json::Value;
use tracing::info;

use shared::types::{CreateUserData, NewUser};

use crate::AppState;
use crate::handlers::executor::{OperationOutput, OperationResult};
use crate::handlers::operations::data_argument;

/// Every user in the directory. Reachable anonymously.
pub async fn handle_all_users(state: AppState) -> OperationResult {
    let users = state.users.list().await?;
    Ok(OperationOutput::value(serde_json::to_value(users)?))
}

/// Create a user, hashing the password before it reaches the store.
pub async fn handle_create_user(state: AppState, args: Value) -> OperationResult {
    let data: CreateUserData = data_argument(args)?;
    data.validate()?;

    let password_hash = state.credentials.hash_async(data.password).await?;

    let user = state
        .users
        .insert(NewUser {
            email: data.email,
            password_hash,
            status: data.status,
        })
        .await?;

    info!("User created: {}", user);

    Ok(OperationOutput::value(serde_json::to_value(user)?))
}
