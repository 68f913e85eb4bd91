//! Fully qualified function names.

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;
use std::str::FromStr;

/// Maximum length of a tool name accepted by agent frameworks.
pub const MAX_TOOL_NAME_LEN: usize = 64;

/// A `<catalog>.<schema>.<function>` name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FunctionName {
    pub catalog: SmolStr,
    pub schema: SmolStr,
    pub name: SmolStr,
}

impl FunctionName {
    pub fn new(
        catalog: impl Into<SmolStr>,
        schema: impl Into<SmolStr>,
        name: impl Into<SmolStr>,
    ) -> Self {
        Self {
            catalog: catalog.into(),
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Parses `catalog.schema.function`; exactly three non-empty parts.
    pub fn parse(full_name: &str) -> Result<Self, CatalogError> {
        let invalid = || CatalogError::InvalidFunctionName {
            name: full_name.to_string(),
        };
        let parts: Vec<&str> = full_name.split('.').map(str::trim).collect();
        match parts.as_slice() {
            [catalog, schema, name]
                if !catalog.is_empty() && !schema.is_empty() && !name.is_empty() =>
            {
                Ok(Self::new(*catalog, *schema, *name))
            }
            _ => Err(invalid()),
        }
    }

    /// The name as an agent-framework tool name: parts joined with `__`,
    /// keeping the last 64 characters when longer.
    pub fn tool_name(&self) -> String {
        let full = format!("{}__{}__{}", self.catalog, self.schema, self.name);
        let len = full.chars().count();
        if len <= MAX_TOOL_NAME_LEN {
            return full;
        }
        let truncated: String = full.chars().skip(len - MAX_TOOL_NAME_LEN).collect();
        tracing::warn!(
            function = %self,
            tool_name = %truncated,
            "tool name exceeds {MAX_TOOL_NAME_LEN} characters, keeping the trailing part"
        );
        truncated
    }

    /// True when this name lives in `catalog.schema`.
    pub fn in_schema(&self, catalog: &str, schema: &str) -> bool {
        self.catalog == catalog && self.schema == schema
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.catalog, self.schema, self.name)
    }
}

impl FromStr for FunctionName {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
