use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};

use storefront_auth::{Identity, TokenCodec};

use crate::context::CurrentIdentity;
use crate::session::SessionCarrier;

/// Resolves the identity behind a request, if any.
#[derive(Debug, Clone)]
pub struct Authenticator {
    codec: Arc<TokenCodec>,
    carrier: SessionCarrier,
}

impl Authenticator {
    pub fn new(codec: Arc<TokenCodec>, carrier: SessionCarrier) -> Self {
        Self { codec, carrier }
    }

    pub fn authenticate(&self, headers: &HeaderMap) -> Option<Identity> {
        self.authenticate_at(headers, Utc::now())
    }

    /// Every failure collapses to `None`; the kind is only logged.
    pub fn authenticate_at(&self, headers: &HeaderMap, now: DateTime<Utc>) -> Option<Identity> {
        let token = self.carrier.extract(headers)?;

        match self.codec.decode_at(token, now) {
            Ok(identity) => Some(identity),
            Err(e) => {
                tracing::debug!(error = %e, expired = e.is_expired(), "session token rejected");
                None
            }
        }
    }
}

/// Attach a [`CurrentIdentity`] to every request. Never rejects.
pub async fn auth_middleware(
    State(auth): State<Authenticator>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let identity = auth.authenticate(req.headers());

    req.extensions_mut().insert(CurrentIdentity::new(identity));

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, header};
    use chrono::Duration;
    use storefront_core::UserId;

    fn identity() -> Identity {
        Identity {
            id: UserId::new(5),
            username: "alice".to_string(),
            email: "alice@shop.io".to_string(),
            is_admin: false,
        }
    }

    fn authenticator() -> Authenticator {
        Authenticator::new(Arc::new(TokenCodec::new("test-secret")), SessionCarrier::new(false))
    }

    fn with_cookie(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("jwtToken={token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn valid_cookie_yields_identity() {
        let auth = authenticator();
        let token = auth.codec.encode(&identity()).unwrap();
        assert_eq!(auth.authenticate(&with_cookie(&token)), Some(identity()));
    }

    #[test]
    fn bearer_header_is_accepted() {
        let auth = authenticator();
        let token = auth.codec.encode(&identity()).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        assert_eq!(auth.authenticate(&headers), Some(identity()));
    }

    #[test]
    fn missing_and_expired_are_indistinguishable() {
        let auth = authenticator();
        let issued = Utc::now() - Duration::days(31);
        let expired = auth.codec.encode_at(&identity(), issued).unwrap();

        let none = auth.authenticate(&HeaderMap::new());
        let stale = auth.authenticate(&with_cookie(&expired));
        assert_eq!(none, None);
        assert_eq!(stale, None);
        assert_eq!(none, stale);
    }

    #[test]
    fn foreign_and_garbage_tokens_are_rejected() {
        let auth = authenticator();
        let foreign = TokenCodec::new("other-secret").encode(&identity()).unwrap();
        assert_eq!(auth.authenticate(&with_cookie(&foreign)), None);
        assert_eq!(auth.authenticate(&with_cookie("not-a-token")), None);
    }
}
