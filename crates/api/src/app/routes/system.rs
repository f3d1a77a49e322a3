use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::context::CurrentIdentity;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Identity resolved for the caller, or `null`.
pub async fn whoami(Extension(current): Extension<CurrentIdentity>) -> impl IntoResponse {
    Json(serde_json::json!({ "identity": current.identity() }))
}
