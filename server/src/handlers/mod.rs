pub mod errors;
pub mod executor;
pub mod http;
pub mod operations;

pub use errors::OperationError;
pub use executor::{CookieDirective, OperationExecutor, OperationOutput, OperationRouter};
pub use operations::{build_executor, build_operation_router};
