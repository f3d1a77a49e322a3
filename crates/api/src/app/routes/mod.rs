use axum::Router;

pub mod comments;
pub mod products;
pub mod system;
pub mod users;

/// Router for everything under `/api`.
pub fn router() -> Router {
    Router::new()
        .nest("/users", users::router())
        .nest("/products", products::router())
        .nest("/comments", comments::router())
}
