//! The catalog side of the bridge: function names, stored function
//! metadata, and the client capability the core talks to.

mod client;
mod info;
mod memory;
mod name;

pub use client::{CatalogClient, delete_all_functions};
pub use info::{FunctionInfo, FunctionReturn, ParameterInfo};
pub use memory::{InMemoryCatalog, glob_match};
pub use name::{FunctionName, MAX_TOOL_NAME_LEN};
