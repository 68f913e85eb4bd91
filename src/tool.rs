//! Catalog functions as agent tools.
//!
//! A [`ToolDefinition`] is what an agent framework registers: a name, a
//! description and a JSON Schema for the arguments. Calls come back as a
//! JSON object of arguments and leave as the JSON result envelope.

use crate::catalog::{CatalogClient, FunctionInfo, FunctionName};
use crate::config::ToolOptions;
use crate::ddl::sql_literal;
use crate::docstring::default_description;
use crate::error::{CatalogResult, ToolError};
use crate::execution::{ArgumentBinding, ExecutionBackend, execute_function};
use crate::types::{ScalarKind, SqlType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json, json};
use std::collections::BTreeSet;

/// A catalog function described for an agent framework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// `catalog__schema__function`, at most 64 characters.
    pub name: String,
    pub function: FunctionName,
    pub description: String,
    /// JSON Schema of the argument object.
    pub parameters: Json,
}

impl ToolDefinition {
    pub fn from_function(info: &FunctionInfo) -> Self {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for parameter in &info.parameters {
            let mut schema = json_schema(&parameter.sql_type);
            let comment = parameter
                .comment
                .clone()
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| default_description(&parameter.name));
            let description = match &parameter.default {
                Some(default) if parameter.has_default => {
                    format!("{comment} (Default: {})", sql_literal(default))
                }
                _ => comment,
            };
            schema["description"] = Json::String(description);
            properties.insert(parameter.name.to_string(), schema);
            if !parameter.has_default {
                required.push(Json::String(parameter.name.to_string()));
            }
        }

        Self {
            name: info.name.tool_name(),
            function: info.name.clone(),
            description: info.comment.clone().unwrap_or_default(),
            parameters: json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        }
    }
}

/// JSON Schema for values of `ty`.
pub fn json_schema(ty: &SqlType) -> Json {
    match ty {
        SqlType::Scalar(kind) => match kind {
            ScalarKind::Integer => json!({"type": "integer"}),
            ScalarKind::Double | ScalarKind::Decimal => json!({"type": "number"}),
            ScalarKind::String => json!({"type": "string"}),
            ScalarKind::Boolean => json!({"type": "boolean"}),
            ScalarKind::Date => json!({"type": "string", "format": "date"}),
            ScalarKind::Timestamp => json!({"type": "string", "format": "date-time"}),
        },
        SqlType::Array(element) => json!({"type": "array", "items": json_schema(element)}),
        SqlType::Map(_, value) => json!({"type": "object", "additionalProperties": json_schema(value)}),
    }
}

/// Resolves function names into tool definitions.
///
/// `catalog.schema.*` expands to every function the catalog lists in that
/// schema, capped at `options.list_max_results`. A function named twice is
/// returned once, at its first position.
pub fn resolve_tools(
    catalog: &dyn CatalogClient,
    names: &[&str],
    options: &ToolOptions,
) -> CatalogResult<Vec<ToolDefinition>> {
    let mut seen = BTreeSet::new();
    let mut tools = Vec::new();
    for name in names {
        for function in expand_name(catalog, name, options)? {
            if !seen.insert(function.clone()) {
                tracing::debug!(function = %function, "skipping duplicate tool");
                continue;
            }
            let info = catalog.get_function(&function)?;
            tools.push(ToolDefinition::from_function(&info));
        }
    }
    tracing::debug!(count = tools.len(), "resolved tools");
    Ok(tools)
}

fn expand_name(
    catalog: &dyn CatalogClient,
    name: &str,
    options: &ToolOptions,
) -> CatalogResult<Vec<FunctionName>> {
    let parsed = FunctionName::parse(name)?;
    if parsed.name != "*" {
        return Ok(vec![parsed]);
    }
    let listed = catalog.list_functions(&parsed.catalog, &parsed.schema, options.list_max_results)?;
    tracing::debug!(pattern = name, count = listed.len(), "expanded wildcard");
    Ok(listed)
}

/// Runs `tool` with a JSON argument object and returns the JSON result
/// envelope.
pub fn execute_tool(
    catalog: &dyn CatalogClient,
    backend: &dyn ExecutionBackend,
    tool: &ToolDefinition,
    arguments: &Json,
) -> Result<Json, ToolError> {
    let args = ArgumentBinding::from_json(arguments).map_err(|message| ToolError::InvalidArguments {
        tool: tool.name.clone(),
        message,
    })?;
    let result = execute_function(catalog, backend, &tool.function.to_string(), &args)?;
    Ok(result.to_json()?)
}
