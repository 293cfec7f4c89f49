//! Request middleware: authentication, correlation ids, validation and rate limiting.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod validate;

pub use auth::{AuthState, auth_middleware};
pub use rate_limit::{FixedWindowLimiter, RATE_LIMIT_MESSAGE, RateLimitState, Sweeper, rate_limit_middleware};
pub use request_id::push_correlation_id;
pub use validate::validated;
