use core::str::FromStr;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use storefront_core::DomainError;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(rename = "searchQuery")]
    pub search_query: Option<String>,
}

impl SearchParams {
    /// Blank queries count as no query.
    pub fn query(&self) -> Option<&str> {
        self.search_query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

// -------------------------
// Extraction helpers
// -------------------------

/// Unwrap a JSON body, answering 400 when it cannot be read.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, axum::response::Response> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", e.body_text()))
}

pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse().map_err(errors::domain_error_to_response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::ProductId;

    #[test]
    fn blank_search_is_no_query() {
        let params = SearchParams {
            search_query: Some("   ".to_string()),
        };
        assert_eq!(params.query(), None);
        assert_eq!(SearchParams::default().query(), None);

        let params = SearchParams {
            search_query: Some(" Phone ".to_string()),
        };
        assert_eq!(params.query(), Some("Phone"));
    }

    #[test]
    fn bad_ids_are_400() {
        assert_eq!(parse_id::<ProductId>("12").unwrap(), ProductId::new(12));
        let res = parse_id::<ProductId>("twelve").unwrap_err();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
