//! The catalog client capability.

use super::info::{FunctionInfo, ParameterInfo};
use super::name::FunctionName;
use crate::error::CatalogError;

/// Access to the catalog service that stores and describes functions.
///
/// Implementations wrap a remote catalog; tests use
/// [`InMemoryCatalog`](super::InMemoryCatalog). Failures are reported, never
/// retried, by the core.
///
/// # Example
///
/// ```ignore
/// struct RestCatalog {
///     http: HttpClient,
/// }
///
/// impl CatalogClient for RestCatalog {
///     fn get_function(&self, name: &FunctionName) -> Result<FunctionInfo, CatalogError> {
///         let body = self.http.get(&format!("/functions/{name}"))?;
///         decode_function_info(&body)
///     }
///
///     // ... implement the other methods
/// }
/// ```
pub trait CatalogClient: Send + Sync {
    /// Fetches a function's declared schema.
    fn get_function(&self, name: &FunctionName) -> Result<FunctionInfo, CatalogError>;

    /// Creates or replaces a function from DDL text, returning its name.
    fn create_function(&self, ddl: &str) -> Result<FunctionName, CatalogError>;

    /// Lists functions in `catalog` whose schema matches `schema_pattern`
    /// (`*` and `%` match any run of characters), at most `max_results`.
    fn list_functions(
        &self,
        catalog: &str,
        schema_pattern: &str,
        max_results: usize,
    ) -> Result<Vec<FunctionName>, CatalogError>;

    /// Deletes a function.
    fn delete_function(&self, name: &FunctionName) -> Result<(), CatalogError>;

    /// The ordered parameter schema of a function.
    ///
    /// # Default Implementation
    ///
    /// Fetches the whole function and keeps its parameters.
    fn get_function_schema(&self, name: &FunctionName) -> Result<Vec<ParameterInfo>, CatalogError> {
        self.get_function(name).map(|info| info.parameters)
    }
}

/// Deletes every function in `catalog.schema`.
///
/// Failures do not stop the sweep; the names that could not be deleted are
/// returned with their errors.
pub fn delete_all_functions(
    client: &dyn CatalogClient,
    catalog: &str,
    schema: &str,
    max_results: usize,
) -> Result<Vec<(FunctionName, CatalogError)>, CatalogError> {
    let names = client.list_functions(catalog, schema, max_results)?;
    tracing::info!(catalog, schema, count = names.len(), "deleting functions");
    let mut failures = Vec::new();
    for name in names {
        if let Err(err) = client.delete_function(&name) {
            tracing::warn!(function = %name, error = %err, "failed to delete function");
            failures.push((name, err));
        }
    }
    Ok(failures)
}
