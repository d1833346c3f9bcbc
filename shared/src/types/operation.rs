use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Request envelope
// ---------------------------------------------------------------------------

/// One named operation with its arguments, e.g.
/// `{"name": "signIn", "arguments": {"data": {...}}}`.
///
/// `alias` renames the entry in the response, so one batch can call the same
/// operation more than once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invocation {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default)]
    pub arguments: Value,
}

impl Invocation {
    pub fn new(name: &str, arguments: Value) -> Self {
        Self {
            name: name.to_string(),
            alias: None,
            arguments,
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    /// Key of this invocation in `data` and `errors`.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Body of `POST /graphql`.
///
/// Accepts either a batch (`{"operations": [...]}`) or a single bare
/// invocation; every invocation in one body shares the same session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperationRequest {
    Batch { operations: Vec<Invocation> },
    Single(Invocation),
}

impl OperationRequest {
    pub fn into_invocations(self) -> Vec<Invocation> {
        match self {
            Self::Batch { operations } => operations,
            Self::Single(invocation) => vec![invocation],
        }
    }
}

/// The first response key used by more than one invocation, if any.
pub fn duplicate_response_key(invocations: &[Invocation]) -> Option<&str> {
    let mut seen = HashSet::new();
    invocations
        .iter()
        .map(Invocation::response_key)
        .find(|key| !seen.insert(*key))
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationErrorBody {
    pub operation: String,
    pub code: String,
    pub message: String,
}

/// `data` holds one entry per invocation (null when it failed); failures are
/// listed in `errors`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationResponse {
    pub data: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<OperationErrorBody>,
}

impl OperationResponse {
    pub fn push_ok(&mut self, operation: &str, value: Value) {
        self.data.insert(operation.to_string(), value);
    }

    pub fn push_error(&mut self, operation: &str, code: &str, message: String) {
        self.data.insert(operation.to_string(), Value::Null);
        self.errors.push(OperationErrorBody {
            operation: operation.to_string(),
            code: code.to_string(),
            message,
        });
    }

    pub fn error_for(&self, operation: &str) -> Option<&OperationErrorBody> {
        self.errors.iter().find(|e| e.operation == operation)
    }
}
