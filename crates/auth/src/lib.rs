//! `teatrade-auth`: bearer-token verification boundary.
//!
//! Tokens are issued by the managed identity provider; this crate only
//! verifies them and turns the claims into a [`Principal`]. It has no HTTP or
//! storage dependencies.

pub mod claims;
pub mod jwt;
pub mod principal;
pub mod roles;

pub use claims::{TokenClaims, TokenValidationError, validate_claims};
pub use jwt::{JwtAlgorithm, JwtValidator, JwtVerifier, VerifierConfig};
pub use principal::Principal;
pub use roles::Role;
