use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use serde_json::Value;
use tracing::{debug, warn};

use shared::types::Invocation;

use crate::AppState;
use crate::auth::context::RequestContext;
use crate::auth::gate::Guard;
use crate::handlers::errors::OperationError;

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Cookie side effect an operation asks the transport to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieDirective {
    SetSession(String),
    ClearSession,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationOutput {
    pub value: Value,
    pub cookies: Vec<CookieDirective>,
}

impl OperationOutput {
    pub fn value(value: Value) -> Self {
        Self {
            value,
            cookies: Vec::new(),
        }
    }

    pub fn with_cookie(mut self, cookie: CookieDirective) -> Self {
        self.cookies.push(cookie);
        self
    }
}

// ---------------------------------------------------------------------------
// Executor seam
// ---------------------------------------------------------------------------

/// Runs one invocation against a request context. Implemented by the router
/// and by wrappers around it such as the shield.
#[async_trait]
pub trait OperationExecutor: Send + Sync {
    async fn execute(
        &self,
        ctx: Arc<RequestContext>,
        invocation: Invocation,
    ) -> Result<OperationOutput, OperationError>;
}

#[async_trait]
impl<E: OperationExecutor + ?Sized> OperationExecutor for Arc<E> {
    async fn execute(
        &self,
        ctx: Arc<RequestContext>,
        invocation: Invocation,
    ) -> Result<OperationOutput, OperationError> {
        (**self).execute(ctx, invocation).await
    }
}

// ---------------------------------------------------------------------------
// Handler type
// ---------------------------------------------------------------------------

pub type OperationResult = Result<OperationOutput, OperationError>;

type OperationHandler = Box<
    dyn Fn(AppState, Arc<RequestContext>, Value) -> BoxFuture<'static, OperationResult>
        + Send
        + Sync,
>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

struct Operation {
    kind: OperationKind,
    guard: Option<Box<dyn Guard>>,
    handler: OperationHandler,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Maps operation names to handlers.
///
/// Handlers registered through the `*_guarded` methods carry their own guard,
/// checked here right before the handler body runs and independently of any
/// executor wrapped around the router.
pub struct OperationRouter {
    state: AppState,
    operations: HashMap<&'static str, Operation>,
}

impl std::fmt::Debug for OperationRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationRouter")
            .field("operations_count", &self.operations.len())
            .finish()
    }
}

impl OperationRouter {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            operations: HashMap::new(),
        }
    }

    fn register<F, Fut>(
        mut self,
        kind: OperationKind,
        name: &'static str,
        guard: Option<Box<dyn Guard>>,
        handler: F,
    ) -> Self
    where
        F: Fn(AppState, Arc<RequestContext>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = OperationResult> + Send + 'static,
    {
        self.operations.insert(
            name,
            Operation {
                kind,
                guard,
                handler: Box::new(move |state, ctx, args| Box::pin(handler(state, ctx, args))),
            },
        );
        self
    }

    // ── Open ─────────────────────────────────────────────────────────────────

    pub fn query<F, Fut>(self, name: &'static str, handler: F) -> Self
    where
        F: Fn(AppState, Arc<RequestContext>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = OperationResult> + Send + 'static,
    {
        self.register(OperationKind::Query, name, None, handler)
    }

    pub fn mutation<F, Fut>(self, name: &'static str, handler: F) -> Self
    where
        F: Fn(AppState, Arc<RequestContext>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = OperationResult> + Send + 'static,
    {
        self.register(OperationKind::Mutation, name, None, handler)
    }

    // ── Guarded ──────────────────────────────────────────────────────────────

    pub fn query_guarded<G, F, Fut>(self, name: &'static str, guard: G, handler: F) -> Self
    where
        G: Guard + 'static,
        F: Fn(AppState, Arc<RequestContext>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = OperationResult> + Send + 'static,
    {
        self.register(OperationKind::Query, name, Some(Box::new(guard)), handler)
    }

    pub fn mutation_guarded<G, F, Fut>(self, name: &'static str, guard: G, handler: F) -> Self
    where
        G: Guard + 'static,
        F: Fn(AppState, Arc<RequestContext>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = OperationResult> + Send + 'static,
    {
        self.register(OperationKind::Mutation, name, Some(Box::new(guard)), handler)
    }

    // ── Introspection ────────────────────────────────────────────────────────

    pub fn kind_of(&self, name: &str) -> Option<OperationKind> {
        self.operations.get(name).map(|op| op.kind)
    }

    pub fn is_guarded(&self, name: &str) -> bool {
        self.operations
            .get(name)
            .is_some_and(|op| op.guard.is_some())
    }
}

#[async_trait]
impl OperationExecutor for OperationRouter {
    async fn execute(
        &self,
        ctx: Arc<RequestContext>,
        invocation: Invocation,
    ) -> Result<OperationOutput, OperationError> {
        let Some(operation) = self.operations.get(invocation.name.as_str()) else {
            warn!("Unknown operation requested: {}", invocation.name);
            return Err(OperationError::UnknownOperation(invocation.name));
        };

        if let Some(guard) = &operation.guard {
            if !guard.can_activate(&ctx) {
                warn!(
                    operation = %invocation.name,
                    guard = guard.name(),
                    "Guard denied operation"
                );
                return Err(OperationError::Forbidden);
            }
        }

        debug!("Dispatching {:?} {}", operation.kind, invocation.name);
        (operation.handler)(self.state.clone(), ctx, invocation.arguments).await
    }
}
