use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use storefront_auth::AuthzError;
use storefront_core::DomainError;
use storefront_infra::StoreError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn not_found(what: &str) -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
}

pub fn internal_error() -> axum::response::Response {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "something went wrong, please try again later",
    )
}

pub fn authz_error_to_response(err: AuthzError) -> axum::response::Response {
    match err {
        AuthzError::Unauthenticated => {
            json_error(StatusCode::UNAUTHORIZED, "unauthenticated", err.to_string())
        }
        AuthzError::Forbidden { policy } => {
            json_error(StatusCode::FORBIDDEN, "forbidden", policy.forbidden_message())
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
    }
}

/// Storage failures are logged here and never echoed to the client.
pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::MissingReference(_) => {
            json_error(StatusCode::NOT_FOUND, "not_found", "referenced resource not found")
        }
        StoreError::Backend(msg) => {
            tracing::error!(error = %msg, "store failure");
            internal_error()
        }
    }
}
