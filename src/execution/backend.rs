//! The execution backend capability.

use super::call::SqlCall;
use crate::error::BackendError;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// Raw rows returned by a backend, before decoding against declared types.
///
/// Cells are JSON: warehouses report strings, sessions may report natives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Json>>,
    /// The backend capped the output; `rows` is a prefix.
    pub truncated: bool,
}

impl RawOutput {
    /// A single-cell result.
    pub fn scalar(value: impl Into<Json>) -> Self {
        Self {
            columns: vec!["result".to_string()],
            rows: vec![vec![value.into()]],
            truncated: false,
        }
    }

    pub fn table(columns: Vec<String>, rows: Vec<Vec<Json>>) -> Self {
        Self {
            columns,
            rows,
            truncated: false,
        }
    }

    pub fn with_truncated(mut self, truncated: bool) -> Self {
        self.truncated = truncated;
        self
    }
}

/// Runs a SQL call and returns its raw output.
///
/// Implementations are interchangeable; the coordinator does not know which
/// one it was given. Closures of the right shape are backends too.
pub trait ExecutionBackend: Send + Sync {
    fn run(&self, call: &SqlCall) -> Result<RawOutput, BackendError>;
}

impl<F> ExecutionBackend for F
where
    F: Fn(&SqlCall) -> Result<RawOutput, BackendError> + Send + Sync,
{
    fn run(&self, call: &SqlCall) -> Result<RawOutput, BackendError> {
        self(call)
    }
}
