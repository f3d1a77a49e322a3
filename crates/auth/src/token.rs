//! Session token codec (HS256 JWT).
//!
//! Encoding never consults storage: a token is a self-contained, signed
//! snapshot of an [`Identity`]. Rotating the secret invalidates every
//! outstanding token.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::claims::{Identity, TokenClaims, TokenValidationError, validate_claims};

/// Validity window of a session token: 30 days.
pub const TOKEN_TTL_SECS: i64 = 60 * 60 * 24 * 30;

/// Why a token was rejected.
///
/// Callers at the HTTP boundary collapse all of these into "unauthenticated";
/// the distinction exists for logging.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token signature does not match")]
    BadSignature,

    #[error(transparent)]
    Window(#[from] TokenValidationError),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl TokenError {
    pub fn is_expired(&self) -> bool {
        matches!(self, TokenError::Window(TokenValidationError::Expired))
    }
}

/// Signs and verifies session tokens with a shared secret.
///
/// Immutable after construction; share it behind an `Arc`.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();

        // Expiry is checked by `validate_claims` (exclusive boundary, no leeway).
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl: Duration::seconds(TOKEN_TTL_SECS),
        }
    }

    /// Override the validity window (tests, short-lived tokens).
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn encode(&self, identity: &Identity) -> Result<String, TokenError> {
        self.encode_at(identity, Utc::now())
    }

    /// Sign `identity` with `exp = now + ttl`.
    ///
    /// Deterministic for identical identity, secret and `now`.
    pub fn encode_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<String, TokenError> {
        let iat = now.timestamp();
        let claims = TokenClaims {
            identity: identity.clone(),
            iat,
            exp: iat.saturating_add(self.ttl.num_seconds()),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn decode(&self, token: &str) -> Result<Identity, TokenError> {
        self.decode_at(token, Utc::now())
    }

    /// Verify the signature, then the validity window at `now`.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, TokenError> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                ErrorKind::ExpiredSignature => TokenError::Window(TokenValidationError::Expired),
                _ => TokenError::Malformed(e.to_string()),
            })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims.identity)
    }
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &"HS256")
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish_non_exhaustive()
    }
}
