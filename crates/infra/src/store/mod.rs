//! Storefront persistence boundary.
//!
//! Handlers and the auth layer depend on the [`Store`] trait only. The
//! concrete store is built once at process start, shared as `Arc<dyn Store>`,
//! and closed explicitly on shutdown.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use r#trait::{Store, StoreError};
