/// Tower middleware wrapped around the request handler.
pub mod tower_timeout_handler;

pub use tower_timeout_handler::{TimeoutLayer, TimeoutService};
