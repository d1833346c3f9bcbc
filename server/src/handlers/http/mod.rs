pub mod routes;
pub mod utils;

pub use routes::{HttpService, build_service, handle_request, serve_request};
