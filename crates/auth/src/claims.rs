use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use storefront_core::UserId;

/// Authenticated identity, as carried inside a session token.
///
/// This is a snapshot taken at login/registration time. A later change to the
/// stored user (e.g. the admin flag) does not alter tokens already issued; the
/// user has to log in again to pick it up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

/// Signed token payload: the identity plus its validity window.
///
/// Timestamps are Unix seconds, matching the registered `iat`/`exp` JWT claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(flatten)]
    pub identity: Identity,

    /// Issued-at.
    pub iat: i64,

    /// Expiration.
    pub exp: i64,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("invalid token time window (exp < iat)")]
    InvalidTimeWindow,
}

/// Deterministically validate the time window of decoded claims.
///
/// Expiry is exclusive: a token is valid only strictly before `exp`.
/// `iat` is not compared with `now`, so a token minted on a node whose clock
/// runs ahead is still accepted. Signature verification happens before this,
/// in the token codec.
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    let now = now.timestamp();
    if claims.exp < claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}
