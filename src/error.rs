//! Error types for compiling and executing catalog functions.
//!
//! Compile-time failures (`CompileError`) are all fatal: no partial DDL is
//! ever produced. Execute-time failures (`ExecuteError`) are fatal to the one
//! call and never retried here. Every variant names the function and, where
//! there is one, the parameter, so callers can correct the input.

use crate::diag::Diag;
use crate::types::{SqlType, TypePath};
use miette::Diagnostic;
use smol_str::SmolStr;
use std::fmt;
use thiserror::Error;

/// What an annotation belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationTarget {
    Parameter(SmolStr),
    ReturnValue,
}

impl fmt::Display for AnnotationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationTarget::Parameter(name) => write!(f, "parameter `{name}`"),
            AnnotationTarget::ReturnValue => write!(f, "return value"),
        }
    }
}

/// Errors raised while compiling a native function into a `FunctionSpec`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum CompileError {
    #[error("function `{function}`: unsupported type `{annotation}` for {path}")]
    #[diagnostic(
        code(udf::compile::unsupported_type),
        help(
            "supported annotations are int, float, str, bool, date, datetime, Decimal, \
             list[T] and dict[K, V] with every element type declared"
        )
    )]
    UnsupportedType {
        function: SmolStr,
        path: TypePath,
        annotation: String,
    },

    #[error("function `{function}`: unsupported signature: {reason}")]
    #[diagnostic(code(udf::compile::unsupported_signature))]
    UnsupportedSignature { function: SmolStr, reason: String },

    #[error("function `{function}`: missing type annotation for {target}")]
    #[diagnostic(
        code(udf::compile::missing_annotation),
        help("every parameter and the return value need an explicit type annotation")
    )]
    MissingAnnotation {
        function: SmolStr,
        target: AnnotationTarget,
    },

    #[error("function `{function}`: malformed annotation for {target}: {diag}")]
    #[diagnostic(code(udf::compile::malformed_annotation))]
    MalformedAnnotation {
        function: SmolStr,
        target: AnnotationTarget,
        /// The annotation text the diagnostic's spans point into.
        annotation: String,
        diag: Diag,
    },

    #[error("function `{function}`: parameter `{parameter}` is optional but has no default value")]
    #[diagnostic(
        code(udf::compile::missing_default),
        help("give the parameter an explicit default, `None` included")
    )]
    MissingDefault { function: SmolStr, parameter: SmolStr },

    #[error(
        "function `{function}`: default for parameter `{parameter}` is a {found}, \
         which is not representable as {expected}"
    )]
    #[diagnostic(code(udf::compile::invalid_default))]
    InvalidDefault {
        function: SmolStr,
        parameter: SmolStr,
        expected: SqlType,
        found: String,
    },

    #[error("invalid {what} `{name}`: expected an identifier")]
    #[diagnostic(code(udf::compile::invalid_identifier))]
    InvalidIdentifier { what: &'static str, name: String },
}

/// Result type for compilation.
pub type CompileResult<T> = std::result::Result<T, CompileError>;

impl CompileError {
    /// Renders a malformed annotation's diagnostic over the annotation text,
    /// with its labelled spans. `None` for every other variant.
    pub fn annotation_report(&self) -> Option<miette::Report> {
        match self {
            CompileError::MalformedAnnotation {
                target,
                annotation,
                diag,
                ..
            } => {
                let name = format!("annotation of {target}");
                Some(diag.to_report(annotation, Some(name.as_str())))
            }
            _ => None,
        }
    }
}

/// Failures of compile-then-create.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum CreateFunctionError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Catalog(#[from] CatalogError),
}

/// Failures reported by a catalog client.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum CatalogError {
    #[error("function `{name}` not found in catalog")]
    #[diagnostic(code(udf::catalog::not_found))]
    NotFound { name: String },

    #[error("permission denied on `{name}`: {reason}")]
    #[diagnostic(code(udf::catalog::permission_denied))]
    PermissionDenied { name: String, reason: String },

    #[error("catalog unavailable: {message}")]
    #[diagnostic(code(udf::catalog::unavailable), help("the catalog may recover; retrying is the caller's decision"))]
    Unavailable { message: String },

    #[error("invalid function name `{name}`, expecting <catalog>.<schema>.<function>")]
    #[diagnostic(code(udf::catalog::invalid_name))]
    InvalidFunctionName { name: String },

    #[error("invalid CREATE FUNCTION statement: {message}")]
    #[diagnostic(code(udf::catalog::invalid_ddl))]
    InvalidDdl { message: String },
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Failures reported by an execution backend.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum BackendError {
    #[error("{}", failure_text(.code, .message))]
    #[diagnostic(code(udf::backend::failed))]
    Failed {
        code: Option<String>,
        message: String,
    },

    #[error("statement still pending after {attempts} polls; increase the wait timeout")]
    #[diagnostic(code(udf::backend::timeout))]
    Timeout { attempts: u32 },

    #[error("malformed backend response: {0}")]
    #[diagnostic(code(udf::backend::malformed_response))]
    MalformedResponse(String),
}

/// Errors raised while executing a catalog function.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum ExecuteError {
    #[error("invalid function name `{name}`, expecting <catalog>.<schema>.<function>")]
    #[diagnostic(code(udf::execute::invalid_name))]
    InvalidFunctionName { name: String },

    #[error("function `{function}` not found")]
    #[diagnostic(code(udf::execute::function_not_found))]
    FunctionNotFound { function: String },

    #[error("permission denied for function `{function}`: {reason}")]
    #[diagnostic(code(udf::execute::permission_denied))]
    PermissionDenied { function: String, reason: String },

    #[error("catalog unavailable while resolving `{function}`: {message}")]
    #[diagnostic(code(udf::execute::catalog_unavailable))]
    CatalogUnavailable { function: String, message: String },

    #[error("function `{function}`: missing required argument `{parameter}`")]
    #[diagnostic(code(udf::execute::missing_argument))]
    MissingArgument { function: String, parameter: String },

    #[error("function `{function}`: unknown argument `{parameter}` (declared parameters: {})", join_names(.declared))]
    #[diagnostic(
        code(udf::execute::unknown_argument),
        help("check the argument name for typos")
    )]
    UnknownArgument {
        function: String,
        parameter: String,
        declared: Vec<String>,
    },

    #[error("function `{function}`: argument `{parameter}` expects {expected}, got {found}{}", position_suffix(.at))]
    #[diagnostic(code(udf::execute::invalid_argument))]
    InvalidArgument {
        function: String,
        parameter: String,
        expected: SqlType,
        found: String,
        /// Position inside a collection argument, e.g. `[2].key`.
        at: Option<String>,
    },

    #[error("function `{function}` failed: {message}")]
    #[diagnostic(code(udf::execute::execution))]
    Execution { function: String, message: String },

    #[error("function `{function}` returned a value that cannot be decoded as {expected}: {message}")]
    #[diagnostic(code(udf::execute::invalid_result))]
    InvalidResult {
        function: String,
        expected: SqlType,
        message: String,
    },
}

pub type ExecuteResult<T> = std::result::Result<T, ExecuteError>;

fn failure_text(code: &Option<String>, message: &str) -> String {
    match code {
        Some(code) => format!("{code}: {message}"),
        None => message.to_string(),
    }
}

fn join_names(names: &[String]) -> String {
    names.join(", ")
}

fn position_suffix(at: &Option<String>) -> String {
    at.as_ref().map(|p| format!(" at {p}")).unwrap_or_default()
}

impl ExecuteError {
    /// Maps a catalog failure for `function` into the execute-time taxonomy.
    pub fn from_catalog(function: &str, err: CatalogError) -> Self {
        let function = function.to_string();
        match err {
            CatalogError::NotFound { .. } => ExecuteError::FunctionNotFound { function },
            CatalogError::PermissionDenied { reason, .. } => {
                ExecuteError::PermissionDenied { function, reason }
            }
            CatalogError::Unavailable { message } => {
                ExecuteError::CatalogUnavailable { function, message }
            }
            CatalogError::InvalidFunctionName { name } => {
                ExecuteError::InvalidFunctionName { name }
            }
            CatalogError::InvalidDdl { message } => ExecuteError::Execution { function, message },
        }
    }
}

/// Failures of calling a catalog function as a tool.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum ToolError {
    #[error("tool `{tool}`: {message}")]
    #[diagnostic(
        code(udf::tool::invalid_arguments),
        help("tool arguments are a JSON object keyed by parameter name")
    )]
    InvalidArguments { tool: String, message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Execute(#[from] ExecuteError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Render(#[from] RenderError),
}

/// A tabular result that could not be written as CSV.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("failed to render result table: {message}")]
#[diagnostic(code(udf::execute::render))]
pub struct RenderError {
    pub message: String,
}

impl From<csv::Error> for RenderError {
    fn from(err: csv::Error) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

/// Malformed configuration input.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("invalid value `{value}` for {variable}: {reason}")]
#[diagnostic(code(udf::config::invalid))]
pub struct ConfigError {
    pub variable: String,
    pub value: String,
    pub reason: String,
}
