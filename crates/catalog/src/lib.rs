//! Storefront domain module: users, products and comments.
//!
//! This crate contains the records and input rules of the storefront,
//! implemented as deterministic domain logic (no IO, no HTTP, no storage).

pub mod comment;
pub mod product;
pub mod user;
pub mod validate;

pub use comment::{Comment, CreateComment, NewComment, UpdateComment};
pub use product::{CreateProduct, DEFAULT_SEARCH_LIMIT, Product, UpdateProduct};
pub use user::{LoginUser, NewUser, RegisterUser, UpdateUser, User, UserCredentials, UserUpdate};

use storefront_core::UserId;

/// A resource with exactly one owning user.
///
/// Owner-based access policies compare the caller against this id.
pub trait Owned {
    fn owner_id(&self) -> UserId;
}
