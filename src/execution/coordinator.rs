//! Fetch, validate, dispatch and normalize.

use super::backend::{ExecutionBackend, RawOutput};
use super::call::{ArgumentBinding, SqlCall, build_call};
use super::result::ExecutionResult;
use crate::catalog::{CatalogClient, FunctionInfo, FunctionName, FunctionReturn};
use crate::error::{ExecuteError, ExecuteResult};
use crate::types::{SqlType, to_native_value};
use crate::value::Value;
use smol_str::SmolStr;

/// Executes catalog functions through a backend.
///
/// Holds borrowed collaborators only; every call re-fetches the function's
/// schema, so out-of-band catalog changes are always seen.
#[derive(Clone, Copy)]
pub struct Coordinator<'a> {
    catalog: &'a dyn CatalogClient,
    backend: &'a dyn ExecutionBackend,
}

impl<'a> Coordinator<'a> {
    pub fn new(catalog: &'a dyn CatalogClient, backend: &'a dyn ExecutionBackend) -> Self {
        Self { catalog, backend }
    }

    /// Executes `name` with `args`.
    pub fn execute(&self, name: &str, args: &ArgumentBinding) -> ExecuteResult<ExecutionResult> {
        let info = self.fetch(name)?;
        let call = build_call(&info, args)?;
        tracing::debug!(function = %info.name, statement = %call.statement, "dispatching call");
        let raw = self.dispatch(&call)?;
        normalize(&info, raw)
    }

    /// Resolves and fetches the function's declared schema.
    pub fn fetch(&self, name: &str) -> ExecuteResult<FunctionInfo> {
        let parsed = FunctionName::parse(name).map_err(|err| ExecuteError::from_catalog(name, err))?;
        self.catalog
            .get_function(&parsed)
            .map_err(|err| ExecuteError::from_catalog(name, err))
    }

    fn dispatch(&self, call: &SqlCall) -> ExecuteResult<RawOutput> {
        self.backend.run(call).map_err(|err| {
            tracing::debug!(function = %call.function, error = %err, "backend failed");
            ExecuteError::Execution {
                function: call.function.to_string(),
                message: err.to_string(),
            }
        })
    }
}

/// Executes `name` with `args` using `catalog` and `backend`.
pub fn execute_function(
    catalog: &dyn CatalogClient,
    backend: &dyn ExecutionBackend,
    name: &str,
    args: &ArgumentBinding,
) -> ExecuteResult<ExecutionResult> {
    Coordinator::new(catalog, backend).execute(name, args)
}

/// Decodes raw backend output against the declared return type.
///
/// The truncation flag is carried over unchanged.
pub fn normalize(info: &FunctionInfo, raw: RawOutput) -> ExecuteResult<ExecutionResult> {
    let function = info.name.to_string();
    let decode = |ty: &SqlType, cell: &serde_json::Value| {
        to_native_value(ty, cell).map_err(|message| ExecuteError::InvalidResult {
            function: function.clone(),
            expected: ty.clone(),
            message,
        })
    };

    match &info.returns {
        FunctionReturn::Scalar(ty) => {
            let cell = raw
                .rows
                .first()
                .and_then(|row| row.first())
                .unwrap_or(&serde_json::Value::Null);
            let value = decode(ty, cell)?;
            Ok(ExecutionResult::scalar(value, raw.truncated))
        }
        FunctionReturn::Table(declared) => {
            let columns: Vec<SmolStr> = if raw.columns.is_empty() {
                declared.iter().map(|(name, _)| name.clone()).collect()
            } else {
                raw.columns.iter().map(SmolStr::new).collect()
            };
            let rows = raw
                .rows
                .iter()
                .map(|row| {
                    row.iter()
                        .enumerate()
                        .map(|(i, cell)| match declared.get(i) {
                            Some((_, ty)) => decode(ty, cell),
                            None => Ok(Value::from_json(cell)),
                        })
                        .collect::<ExecuteResult<Vec<_>>>()
                })
                .collect::<ExecuteResult<Vec<_>>>()?;
            Ok(ExecutionResult::table(columns, rows, raw.truncated))
        }
    }
}
