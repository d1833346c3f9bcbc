//! Operation handlers and their registration.
//!
//! `me` and `signOut` are registered with [`AuthGuard`] here and are also
//! listed in the shield's rule table. Each layer denies an anonymous caller on
//! its own.

pub mod me;
pub mod sign_in;
pub mod sign_out;
pub mod users;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::AppState;
use crate::auth::gate::{AuthGuard, Shield, default_rules};
use crate::handlers::errors::OperationError;
use crate::handlers::executor::OperationRouter;

pub fn build_operation_router(state: AppState) -> OperationRouter {
    OperationRouter::new(state)
        // ── Open ─────────────────────────────────────────────────────────────
        .query("allUsers", |state, _ctx, _args| users::handle_all_users(state))
        .mutation("createUser", |state, _ctx, args| {
            users::handle_create_user(state, args)
        })
        .mutation("signIn", |state, _ctx, args| sign_in::handle_sign_in(state, args))
        // ── Guarded ──────────────────────────────────────────────────────────
        .query_guarded("me", AuthGuard, |_state, ctx, _args| me::handle_me(ctx))
        .mutation_guarded("signOut", AuthGuard, |_state, ctx, _args| {
            sign_out::handle_sign_out(ctx)
        })
}

/// Router wrapped in the declarative shield: the executor every request uses.
pub fn build_executor(state: AppState) -> Shield<OperationRouter> {
    Shield::new(build_operation_router(state), default_rules())
}

/// Deserialize the `data` argument of an invocation.
pub(crate) fn data_argument<T: DeserializeOwned>(args: Value) -> Result<T, OperationError> {
    let Value::Object(mut map) = args else {
        return Err(OperationError::InvalidArguments(
            "expected an object with a `data` field".to_string(),
        ));
    };

    let data = map
        .remove("data")
        .ok_or_else(|| OperationError::InvalidArguments("missing `data`".to_string()))?;

    serde_json::from_value(data).map_err(|e| OperationError::InvalidArguments(e.to_string()))
}
