//! HTTP API: server wiring, middleware and request/response mapping.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;
pub mod upload;

pub use app::build_app;
pub use app::state::{AppState, build_verifier};
