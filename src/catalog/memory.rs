//! In-memory catalog for tests and local use.

use super::client::CatalogClient;
use super::info::FunctionInfo;
use super::name::FunctionName;
use crate::ddl::parse_create_function;
use crate::error::CatalogError;
use glob::Pattern;
use smol_str::SmolStr;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A catalog held in memory.
///
/// Created functions are stored as the schema read back from their DDL, so
/// what `get_function` reports is what the DDL declared. Schemas can be
/// marked as denied, and the whole catalog as unavailable, to exercise
/// failure paths.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    functions: RwLock<BTreeMap<FunctionName, FunctionInfo>>,
    denied: RwLock<BTreeMap<(SmolStr, SmolStr), String>>,
    unavailable: RwLock<Option<String>>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a function schema directly, bypassing DDL.
    pub fn insert(&self, info: FunctionInfo) -> Result<(), CatalogError> {
        self.write_functions()?.insert(info.name.clone(), info);
        Ok(())
    }

    /// Denies every operation on `catalog.schema` with `reason`.
    pub fn deny_schema(
        &self,
        catalog: &str,
        schema: &str,
        reason: impl Into<String>,
    ) -> Result<(), CatalogError> {
        self.denied
            .write()
            .map_err(|_| poisoned())?
            .insert((catalog.into(), schema.into()), reason.into());
        Ok(())
    }

    /// Makes every operation fail as unavailable until cleared with `None`.
    pub fn set_unavailable(&self, message: Option<String>) -> Result<(), CatalogError> {
        *self.unavailable.write().map_err(|_| poisoned())? = message;
        Ok(())
    }

    /// Number of stored functions.
    pub fn len(&self) -> usize {
        self.functions.read().map(|f| f.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), CatalogError> {
        match self.unavailable.read().map_err(|_| poisoned())?.as_ref() {
            Some(message) => Err(CatalogError::Unavailable {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn check_access(&self, name: &FunctionName) -> Result<(), CatalogError> {
        self.check_available()?;
        let denied = self.denied.read().map_err(|_| poisoned())?;
        match denied.get(&(name.catalog.clone(), name.schema.clone())) {
            Some(reason) => Err(CatalogError::PermissionDenied {
                name: name.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn read_functions(&self) -> Result<RwLockReadGuard<'_, BTreeMap<FunctionName, FunctionInfo>>, CatalogError> {
        self.functions.read().map_err(|_| poisoned())
    }

    fn write_functions(
        &self,
    ) -> Result<RwLockWriteGuard<'_, BTreeMap<FunctionName, FunctionInfo>>, CatalogError> {
        self.functions.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> CatalogError {
    CatalogError::Unavailable {
        message: "in-memory catalog lock poisoned".to_string(),
    }
}

impl CatalogClient for InMemoryCatalog {
    fn get_function(&self, name: &FunctionName) -> Result<FunctionInfo, CatalogError> {
        self.check_access(name)?;
        self.read_functions()?
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound {
                name: name.to_string(),
            })
    }

    fn create_function(&self, ddl: &str) -> Result<FunctionName, CatalogError> {
        let info = parse_create_function(ddl)?;
        self.check_access(&info.name)?;
        let name = info.name.clone();
        tracing::debug!(function = %name, "storing function");
        self.write_functions()?.insert(name.clone(), info);
        Ok(name)
    }

    fn list_functions(
        &self,
        catalog: &str,
        schema_pattern: &str,
        max_results: usize,
    ) -> Result<Vec<FunctionName>, CatalogError> {
        self.check_available()?;
        Ok(self
            .read_functions()?
            .keys()
            .filter(|name| name.catalog == catalog && glob_match(schema_pattern, &name.schema))
            .take(max_results)
            .cloned()
            .collect())
    }

    fn delete_function(&self, name: &FunctionName) -> Result<(), CatalogError> {
        self.check_access(name)?;
        self.write_functions()?
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| CatalogError::NotFound {
                name: name.to_string(),
            })
    }
}

/// Matches `text` against a pattern where `*` and `%` match any run of
/// characters. Everything else matches literally.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let mut normalized = String::with_capacity(pattern.len());
    for (i, literal) in pattern.split(['*', '%']).enumerate() {
        if i > 0 && !normalized.ends_with('*') {
            normalized.push('*');
        }
        normalized.push_str(&Pattern::escape(literal));
    }
    Pattern::new(&normalized).is_ok_and(|compiled| compiled.matches(text))
}
