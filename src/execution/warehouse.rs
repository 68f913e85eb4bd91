//! Backend for a SQL warehouse's synchronous statement endpoint.

use super::backend::{ExecutionBackend, RawOutput};
use super::call::{SqlCall, StatementParameter};
use crate::config::ExecutionOptions;
use crate::error::BackendError;
use serde::{Deserialize, Serialize};
use backon::BlockingRetryable;
use serde_json::Value as Json;
use std::thread;
use std::time::Duration;

// ============================================================================
// Statement API payloads
// ============================================================================

/// A statement submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementRequest {
    pub warehouse_id: String,
    pub statement: String,
    pub parameters: Vec<StatementParameter>,
    /// Synchronous wait, as text such as `30s`.
    pub wait_timeout: String,
    pub row_limit: usize,
    pub byte_limit: usize,
}

/// Lifecycle state of a submitted statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Canceled,
    Closed,
}

impl StatementState {
    /// The statement has not reached a terminal state yet.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, StatementState::Pending | StatementState::Running)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(default)]
    pub type_text: String,
}

/// Shape of a succeeded statement's result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultManifest {
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
    /// The row or byte limit cut the result short.
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultData {
    /// Row-major cells; absent when the result has no rows.
    #[serde(default)]
    pub data_array: Vec<Vec<Json>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementResponse {
    pub statement_id: String,
    pub state: StatementState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StatementError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<ResultManifest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultData>,
}

/// The warehouse's statement endpoint. Transport and authentication belong
/// to the implementation.
pub trait StatementService: Send + Sync {
    fn execute_statement(&self, request: &StatementRequest) -> Result<StatementResponse, BackendError>;

    fn get_statement(&self, statement_id: &str) -> Result<StatementResponse, BackendError>;
}

// ============================================================================
// Backend
// ============================================================================

/// Runs calls as parametrised statements on one warehouse.
#[derive(Debug, Clone)]
pub struct WarehouseBackend<E> {
    service: E,
    warehouse_id: String,
    options: ExecutionOptions,
}

impl<E: StatementService> WarehouseBackend<E> {
    pub fn new(service: E, warehouse_id: impl Into<String>) -> Self {
        Self::with_options(service, warehouse_id, ExecutionOptions::default())
    }

    pub fn with_options(service: E, warehouse_id: impl Into<String>, options: ExecutionOptions) -> Self {
        Self {
            service,
            warehouse_id: warehouse_id.into(),
            options,
        }
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    pub fn service(&self) -> &E {
        &self.service
    }

    fn request(&self, call: &SqlCall) -> StatementRequest {
        StatementRequest {
            warehouse_id: self.warehouse_id.clone(),
            statement: call.statement.clone(),
            parameters: call.parameters.clone(),
            wait_timeout: self.options.wait_timeout_text(),
            row_limit: self.options.row_limit,
            byte_limit: self.options.byte_limit,
        }
    }

    /// Polls until the statement leaves `Pending`/`Running` or the poll
    /// budget runs out.
    fn wait(&self, response: StatementResponse) -> Result<StatementResponse, BackendError> {
        if !response.state.is_in_progress() {
            return Ok(response);
        }
        let statement_id = response.statement_id.clone();
        let mut submitted = Some(response);
        let poll = || {
            let response = match submitted.take() {
                Some(response) => response,
                None => self.service.get_statement(&statement_id).map_err(Poll::Failed)?,
            };
            if response.state.is_in_progress() {
                Err(Poll::InProgress)
            } else {
                Ok(response)
            }
        };

        poll.retry(self.options.poll_policy())
            .sleep(thread::sleep)
            .when(|err| matches!(err, Poll::InProgress))
            .notify(|_, delay: Duration| {
                tracing::info!(
                    statement_id = %statement_id,
                    delay_ms = delay.as_millis() as u64,
                    "statement still running, polling"
                );
            })
            .call()
            .map_err(|err| match err {
                Poll::InProgress => BackendError::Timeout {
                    attempts: self.options.poll_attempts,
                },
                Poll::Failed(err) => err,
            })
    }
}

/// Why a poll did not produce a finished statement.
enum Poll {
    InProgress,
    Failed(BackendError),
}

impl<E: StatementService> ExecutionBackend for WarehouseBackend<E> {
    fn run(&self, call: &SqlCall) -> Result<RawOutput, BackendError> {
        tracing::info!(function = %call.function, warehouse = %self.warehouse_id, "submitting statement");
        let response = self.service.execute_statement(&self.request(call))?;
        let response = self.wait(response)?;
        into_output(response)
    }
}

fn into_output(response: StatementResponse) -> Result<RawOutput, BackendError> {
    match response.state {
        StatementState::Succeeded => {}
        StatementState::Failed => {
            let error = response.error.ok_or_else(|| {
                BackendError::MalformedResponse(format!(
                    "statement `{}` failed without an error",
                    response.statement_id
                ))
            })?;
            return Err(BackendError::Failed {
                code: error.error_code,
                message: error.message,
            });
        }
        other => {
            return Err(BackendError::Failed {
                code: None,
                message: format!("statement `{}` ended in state {other:?}", response.statement_id),
            });
        }
    }

    let (Some(manifest), Some(result)) = (response.manifest, response.result) else {
        return Err(BackendError::MalformedResponse(format!(
            "statement `{}` succeeded without a manifest and result",
            response.statement_id
        )));
    };

    Ok(RawOutput {
        columns: manifest.columns.into_iter().map(|c| c.name).collect(),
        rows: result.data_array,
        truncated: manifest.truncated,
    })
}
