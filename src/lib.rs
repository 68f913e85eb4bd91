//! Bridge between native functions and catalog-registered SQL functions.
//!
//! This library compiles a typed native function into `CREATE FUNCTION` DDL
//! for a catalog, and executes catalog functions on behalf of callers with
//! typed argument checking, pluggable execution backends and normalized
//! results. Type and annotation errors are reported with miette diagnostics.
//!
//! # Example
//!
//! ```
//! use udf_bridge::{
//!     ArgumentBinding, BackendError, ExecutionResult, InMemoryCatalog, NativeFunction,
//!     NativeParameter, RawOutput, SqlCall, create_native_function, execute_function,
//! };
//!
//! let catalog = InMemoryCatalog::new();
//! let add = NativeFunction::new("add")
//!     .param(NativeParameter::typed("a", "int"))
//!     .param(NativeParameter::typed("b", "int"))
//!     .returns("int")
//!     .body("return a + b");
//! create_native_function(&catalog, &add, "main", "default", None).unwrap();
//!
//! // A stand-in backend that always answers 3.
//! let backend = |_: &SqlCall| -> Result<RawOutput, BackendError> { Ok(RawOutput::scalar("3")) };
//! let args = ArgumentBinding::new().with("a", 1_i64).with("b", 2_i64);
//! let result = execute_function(&catalog, &backend, "main.default.add", &args).unwrap();
//! assert_eq!(result, ExecutionResult::scalar(3_i64, false));
//! ```

pub mod catalog;
pub mod compiler;
pub mod config;
pub mod ddl;
pub mod diag;
pub mod docstring;
pub mod error;
pub mod execution;
pub mod span;
pub mod tool;
pub mod types;
pub mod value;

// Re-export source span primitives.
pub use span::{Span, Spanned};

// Re-export the main entry points for convenience.
pub use catalog::{CatalogClient, FunctionInfo, FunctionName, FunctionReturn, InMemoryCatalog, ParameterInfo};
pub use compiler::{FunctionParameter, FunctionSpec, NativeFunction, NativeParameter, compile, create_native_function};
pub use config::{ExecutionOptions, ToolOptions};
pub use diag::{Diag, DiagLabel, DiagSeverity};
pub use docstring::{DocString, parse_docstring};
pub use error::{BackendError, CatalogError, CompileError, CreateFunctionError, ExecuteError, RenderError, ToolError};
pub use execution::{
    ArgumentBinding, Coordinator, ExecutionBackend, ExecutionResult, RawOutput, SqlCall, execute_function,
};
pub use tool::{ToolDefinition, resolve_tools};
pub use types::{NativeType, ScalarKind, SqlType};
pub use value::Value;
