//! Function metadata as stored in a catalog.

use super::name::FunctionName;
use crate::types::SqlType;
use crate::value::Value;
use smol_str::SmolStr;

/// A declared parameter of a stored function.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterInfo {
    pub name: SmolStr,
    pub sql_type: SqlType,
    pub has_default: bool,
    /// The default as a native value, when the catalog reports one that
    /// could be read back.
    pub default: Option<Value>,
    pub comment: Option<String>,
}

impl ParameterInfo {
    /// A required parameter with no comment.
    pub fn required(name: impl Into<SmolStr>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            has_default: false,
            default: None,
            comment: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.has_default = true;
        self.default = Some(default.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// What a stored function returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionReturn {
    Scalar(SqlType),
    /// Table functions return named, typed columns.
    Table(Vec<(SmolStr, SqlType)>),
}

impl FunctionReturn {
    pub fn is_table(&self) -> bool {
        matches!(self, FunctionReturn::Table(_))
    }
}

/// A stored function's declared schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionInfo {
    pub name: FunctionName,
    pub parameters: Vec<ParameterInfo>,
    pub returns: FunctionReturn,
    pub comment: Option<String>,
    pub language: Option<String>,
}

impl FunctionInfo {
    pub fn new(name: FunctionName, returns: FunctionReturn) -> Self {
        Self {
            name,
            parameters: Vec::new(),
            returns,
            comment: None,
            language: None,
        }
    }

    pub fn with_parameter(mut self, parameter: ParameterInfo) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterInfo> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Declared parameter names, in order.
    pub fn parameter_names(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name.to_string()).collect()
    }
}
