//! `storefront-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it mints and
//! verifies session tokens, hashes passwords, and decides access policies.
//! Transport binding (cookies, headers) lives in the API crate.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod token;

pub use authorize::{AuthzError, Decision, DenialReason, Policy, authorize, decide};
pub use claims::{Identity, TokenClaims, TokenValidationError, validate_claims};
pub use password::{PasswordError, hash_password, verify_password};
pub use token::{TOKEN_TTL_SECS, TokenCodec, TokenError};
