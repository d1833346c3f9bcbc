//! Helpers shared by the server integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{Value, json};

use server::auth::{RequestContext, SigningSecret, TokenService};
use server::database::{MemoryUserStore, UserStore};
use server::handlers::OperationError;
use server::handlers::executor::{OperationExecutor, OperationOutput};
use server::{App, AppState, SessionSettings};
use shared::types::{Invocation, User};

pub const SECRET: &str = "integration-test-signing-secret-0123456789";
pub const EMAIL: &str = "a@x.com";
pub const PASSWORD: &str = "secret123";

pub fn tokens() -> Arc<TokenService> {
    Arc::new(TokenService::new(&SigningSecret::new(SECRET)).unwrap())
}

pub fn state_with(store: Arc<MemoryUserStore>) -> AppState {
    let users: Arc<dyn UserStore> = store;
    AppState::new(users, tokens(), SessionSettings::default())
}

/// A fully wired app over a fresh in-memory store.
pub fn app() -> (App, Arc<MemoryUserStore>) {
    let store = Arc::new(MemoryUserStore::new());
    (App::new(state_with(Arc::clone(&store))), store)
}

pub fn anonymous() -> Arc<RequestContext> {
    Arc::new(RequestContext::anonymous())
}

pub fn signed_in(user: User) -> Arc<RequestContext> {
    Arc::new(RequestContext::authenticated(user))
}

pub fn credentials(email: &str, password: &str) -> Value {
    json!({"data": {"email": email, "password": password}})
}

pub async fn run(
    app: &App,
    ctx: Arc<RequestContext>,
    name: &str,
    arguments: Value,
) -> Result<OperationOutput, OperationError> {
    app.executor.execute(ctx, Invocation::new(name, arguments)).await
}

/// Create the standard test account through the `createUser` operation.
pub async fn seed_user(app: &App) -> User {
    let out = run(
        app,
        anonymous(),
        "createUser",
        json!({"data": {"email": EMAIL, "password": PASSWORD, "status": "user"}}),
    )
    .await
    .unwrap();
    serde_json::from_value(out.value).unwrap()
}

/// Sign in with the standard test account and return the issued token.
pub async fn sign_in(app: &App) -> String {
    let out = run(app, anonymous(), "signIn", credentials(EMAIL, PASSWORD))
        .await
        .unwrap();
    out.value["token"].as_str().unwrap().to_string()
}
