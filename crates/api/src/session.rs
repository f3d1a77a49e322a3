//! Session carrier: binds session tokens to HTTP cookies.
//!
//! The token travels in an `HttpOnly` cookie named [`COOKIE_NAME`]. Clients
//! that cannot hold cookies may send `Authorization: Bearer <token>` instead.

use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::{HeaderMap, HeaderValue};

use storefront_auth::TOKEN_TTL_SECS;

pub const COOKIE_NAME: &str = "jwtToken";

const CLEAR_COOKIE: &str = "jwtToken=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0";
const CLEAR_COOKIE_SECURE: &str = "jwtToken=; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age=0";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SessionCarrier {
    secure: bool,
}

impl SessionCarrier {
    /// `secure` adds the `Secure` attribute; enable it in production.
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    /// `Set-Cookie` value carrying `token`.
    pub fn attach(&self, token: &str) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
        let secure = if self.secure { " Secure;" } else { "" };
        HeaderValue::from_str(&format!(
            "{COOKIE_NAME}={token}; HttpOnly;{secure} SameSite=Strict; Path=/; Max-Age={TOKEN_TTL_SECS}"
        ))
    }

    /// `Set-Cookie` value that makes the client drop the session cookie.
    pub fn clear(&self) -> HeaderValue {
        if self.secure {
            HeaderValue::from_static(CLEAR_COOKIE_SECURE)
        } else {
            HeaderValue::from_static(CLEAR_COOKIE)
        }
    }

    /// Token sent with the request: cookie first, then bearer header.
    pub fn extract<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        from_cookie(headers).or_else(|| from_bearer(headers))
    }
}

fn from_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
}

fn from_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.trim_start().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(axum::http::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn attach_sets_fixed_attributes() {
        let cookie = SessionCarrier::new(false).attach("abc.def.ghi").unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "jwtToken=abc.def.ghi; HttpOnly; SameSite=Strict; Path=/; Max-Age=2592000"
        );
    }

    #[test]
    fn production_cookie_is_secure() {
        let carrier = SessionCarrier::new(true);
        let cookie = carrier.attach("t").unwrap();
        assert!(cookie.to_str().unwrap().contains("; Secure;"));
        assert!(carrier.clear().to_str().unwrap().contains("Secure"));
    }

    #[test]
    fn clear_expires_the_same_cookie() {
        let cleared = SessionCarrier::new(false).clear();
        let value = cleared.to_str().unwrap();
        assert!(value.starts_with("jwtToken=;"));
        assert!(value.ends_with("Max-Age=0"));
    }

    #[test]
    fn extracts_from_cookie_among_others() {
        let h = headers(&[(COOKIE, "theme=dark; jwtToken=tok123; lang=en")]);
        assert_eq!(SessionCarrier::new(false).extract(&h), Some("tok123"));
    }

    #[test]
    fn cookie_wins_over_bearer() {
        let h = headers(&[(COOKIE, "jwtToken=from-cookie"), (AUTHORIZATION, "Bearer from-header")]);
        assert_eq!(SessionCarrier::new(false).extract(&h), Some("from-cookie"));
    }

    #[test]
    fn falls_back_to_bearer() {
        let h = headers(&[(COOKIE, "theme=dark"), (AUTHORIZATION, "Bearer tok456")]);
        assert_eq!(SessionCarrier::new(false).extract(&h), Some("tok456"));
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        let carrier = SessionCarrier::new(false);
        assert_eq!(carrier.extract(&headers(&[(AUTHORIZATION, "bearer tok789")])), Some("tok789"));
        assert_eq!(carrier.extract(&headers(&[(AUTHORIZATION, "BEARER tok789")])), Some("tok789"));
        assert_eq!(carrier.extract(&headers(&[(AUTHORIZATION, "Bearertok789")])), None);
    }

    #[test]
    fn empty_values_are_absent() {
        let carrier = SessionCarrier::new(false);
        assert_eq!(carrier.extract(&HeaderMap::new()), None);
        assert_eq!(carrier.extract(&headers(&[(COOKIE, "jwtToken=")])), None);
        assert_eq!(carrier.extract(&headers(&[(AUTHORIZATION, "Bearer   ")])), None);
        assert_eq!(carrier.extract(&headers(&[(AUTHORIZATION, "Basic dXNlcg==")])), None);
    }

    #[test]
    fn similarly_named_cookies_do_not_match() {
        let h = headers(&[(COOKIE, "jwtTokenOld=stale; xjwtToken=nope")]);
        assert_eq!(SessionCarrier::new(false).extract(&h), None);
    }
}
