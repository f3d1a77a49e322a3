//! HTTP API application wiring (Axum router + shared services).
//!
//! - `services.rs`: collaborators shared by handlers (store, token codec, cookie carrier)
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs and extraction helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
///
/// Authentication runs on every route and only annotates the request; each
/// handler applies its own access policy.
pub fn build_app(services: Arc<AppServices>) -> Router {
    let authenticator = middleware::Authenticator::new(services.codec.clone(), services.carrier);

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/whoami", get(routes::system::whoami))
        .nest("/api", routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(Extension(services))
                .layer(axum::middleware::from_fn_with_state(
                    authenticator,
                    middleware::auth_middleware,
                )),
        )
}
