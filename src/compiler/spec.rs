//! Compiled function signatures.

use crate::catalog::{FunctionInfo, FunctionName, FunctionReturn, ParameterInfo};
use crate::types::SqlType;
use crate::value::Value;
use smol_str::SmolStr;

/// A parameter of a compiled function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionParameter {
    pub name: SmolStr,
    pub sql_type: SqlType,
    /// Tool-facing text: the comment, plus ` (Default: <literal>)` when the
    /// parameter has a default.
    pub description: String,
    pub has_default: bool,
    /// `None` when there is no default; `Some(Value::Null)` for a NULL default.
    pub default_value: Option<Value>,
    /// Documentation rendered into the DDL `COMMENT` clause.
    pub comment: String,
}

impl FunctionParameter {
    /// Required when there is no default.
    pub fn is_required(&self) -> bool {
        !self.has_default
    }
}

/// The result of compiling a native function. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSpec {
    pub name: FunctionName,
    /// In native declaration order.
    pub parameters: Vec<FunctionParameter>,
    pub return_type: SqlType,
    pub description: String,
    pub language: String,
    pub raw_ddl: String,
}

impl FunctionSpec {
    /// The schema a catalog should report after storing `raw_ddl`.
    pub fn to_function_info(&self) -> FunctionInfo {
        let parameters = self
            .parameters
            .iter()
            .map(|p| ParameterInfo {
                name: p.name.clone(),
                sql_type: p.sql_type.clone(),
                has_default: p.has_default,
                default: p.default_value.clone(),
                comment: (!p.comment.is_empty()).then(|| p.comment.clone()),
            })
            .collect();
        FunctionInfo {
            name: self.name.clone(),
            parameters,
            returns: FunctionReturn::Scalar(self.return_type.clone()),
            comment: Some(self.description.clone()),
            language: Some(self.language.to_ascii_uppercase()),
        }
    }
}
