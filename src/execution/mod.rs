//! Execution of catalog functions.
//!
//! A call goes through four steps, each a separate piece here:
//!
//! 1. fetch the function's schema from the catalog ([`Coordinator::fetch`])
//! 2. validate the arguments and build the SQL call ([`build_call`])
//! 3. hand the call to an [`ExecutionBackend`]
//! 4. decode the backend's raw rows against the declared return type
//!    ([`normalize`])
//!
//! Two backends are provided: [`WarehouseBackend`] for a statement endpoint
//! that binds parameters, and [`SessionBackend`] for a session that takes
//! plain SQL. Any `Fn(&SqlCall) -> Result<RawOutput, BackendError>` works as
//! a backend as well.

mod backend;
mod call;
mod coordinator;
mod result;
mod session;
mod warehouse;

pub use backend::{ExecutionBackend, RawOutput};
pub use call::{ArgumentBinding, FUNCTION_NAME_PARAMETER, SqlCall, StatementParameter, build_call};
pub use coordinator::{Coordinator, execute_function, normalize};
pub use result::{ExecutionResult, ResultFormat, ResultValue};
pub use session::{SessionBackend, SqlSession};
pub use warehouse::{
    ColumnInfo, ResultData, ResultManifest, StatementError, StatementRequest, StatementResponse,
    StatementService, StatementState, WarehouseBackend,
};
