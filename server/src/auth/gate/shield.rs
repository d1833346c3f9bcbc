use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use shared::types::Invocation;

use crate::auth::context::RequestContext;
use crate::auth::gate::Rule;
use crate::handlers::errors::OperationError;
use crate::handlers::executor::{OperationExecutor, OperationOutput};

/// Static mapping from operation name to access rule.
///
/// Operations without an entry fall back to `fallback`.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: HashMap<&'static str, Rule>,
    fallback: Rule,
}

impl RuleTable {
    pub fn new(fallback: Rule) -> Self {
        Self {
            rules: HashMap::new(),
            fallback,
        }
    }

    pub fn with_rule(mut self, operation: &'static str, rule: Rule) -> Self {
        self.rules.insert(operation, rule);
        self
    }

    pub fn rule_for(&self, operation: &str) -> Rule {
        self.rules.get(operation).copied().unwrap_or(self.fallback)
    }
}

/// The allow-list of sensitive operations. Everything else is open.
pub fn default_rules() -> RuleTable {
    RuleTable::new(Rule::Allow)
        .with_rule("me", Rule::IsAuthenticated)
        .with_rule("signOut", Rule::IsAuthenticated)
}

/// Declarative layer: wraps an executor and fails closed before the inner
/// executor is reached when the operation's rule does not hold.
pub struct Shield<E> {
    inner: E,
    rules: Arc<RuleTable>,
}

impl<E> Shield<E> {
    pub fn new(inner: E, rules: RuleTable) -> Self {
        Self {
            inner,
            rules: Arc::new(rules),
        }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }
}

#[async_trait]
impl<E: OperationExecutor> OperationExecutor for Shield<E> {
    async fn execute(
        &self,
        ctx: Arc<RequestContext>,
        invocation: Invocation,
    ) -> Result<OperationOutput, OperationError> {
        let rule = self.rules.rule_for(&invocation.name);

        if !rule.evaluate(&ctx) {
            warn!(
                operation = %invocation.name,
                rule = ?rule,
                "Shield denied operation"
            );
            return Err(OperationError::NotAuthorised);
        }

        self.inner.execute(ctx, invocation).await
    }
}
