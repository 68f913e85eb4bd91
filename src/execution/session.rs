//! Backend for an interactive compute session that accepts plain SQL.

use super::backend::{ExecutionBackend, RawOutput};
use super::call::SqlCall;
use crate::config::ExecutionOptions;
use crate::error::BackendError;

/// A session that runs one SQL statement and returns every row.
pub trait SqlSession: Send + Sync {
    fn sql(&self, statement: &str) -> Result<RawOutput, BackendError>;
}

/// Runs calls through a [`SqlSession`] using their inline form.
///
/// Sessions have no row limit of their own, so the backend applies
/// `row_limit` and flags the result as truncated when rows were dropped.
#[derive(Debug, Clone)]
pub struct SessionBackend<S> {
    session: S,
    options: ExecutionOptions,
}

impl<S: SqlSession> SessionBackend<S> {
    pub fn new(session: S) -> Self {
        Self::with_options(session, ExecutionOptions::default())
    }

    pub fn with_options(session: S, options: ExecutionOptions) -> Self {
        Self { session, options }
    }

    pub fn session(&self) -> &S {
        &self.session
    }
}

impl<S: SqlSession> ExecutionBackend for SessionBackend<S> {
    fn run(&self, call: &SqlCall) -> Result<RawOutput, BackendError> {
        tracing::info!(function = %call.function, "running call in session");
        let mut output = self.session.sql(&call.inline)?;
        if output.rows.len() > self.options.row_limit {
            tracing::debug!(
                function = %call.function,
                rows = output.rows.len(),
                limit = self.options.row_limit,
                "truncating session result"
            );
            output.rows.truncate(self.options.row_limit);
            output.truncated = true;
        }
        Ok(output)
    }
}
