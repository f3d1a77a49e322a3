//! Infrastructure layer: persistence adapters behind the `Store` boundary.

pub mod store;

pub use store::{InMemoryStore, PostgresStore, Store, StoreError};
