use async_trait::async_trait;
use thiserror::Error;

use storefront_catalog::{
    Comment, CreateProduct, NewComment, NewUser, Owned, Product, UpdateProduct, User,
    UserCredentials, UserUpdate,
};
use storefront_core::{CommentId, ProductId, UserId};

/// Store operation error.
///
/// These are **infrastructure errors**. Missing rows are not errors: lookups
/// return `Option`, deletes return whether a row was removed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated (e.g. an email already registered).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A referenced row does not exist (e.g. comment on a deleted product).
    #[error("missing reference: {0}")]
    MissingReference(String),

    /// Anything else: connection loss, pool closed, poisoned lock, bad row.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Persistence collaborator for users, products and comments.
///
/// Implementations must:
/// - assign ids on insert
/// - keep emails unique across users
/// - delete a user's or product's comments together with it
/// - treat search as a case-insensitive substring match on product titles
#[async_trait]
pub trait Store: Send + Sync {
    // --- users ---

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Login lookup: the user plus its password hash.
    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, StoreError>;

    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<Option<User>, StoreError>;

    async fn set_admin(&self, id: UserId, is_admin: bool) -> Result<Option<User>, StoreError>;

    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError>;

    // --- products ---

    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    async fn count_products(&self) -> Result<u64, StoreError>;

    /// Title search. `None` returns the first `DEFAULT_SEARCH_LIMIT` products.
    async fn search_products(&self, query: Option<&str>) -> Result<Vec<Product>, StoreError>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    async fn create_product(&self, product: CreateProduct) -> Result<Product, StoreError>;

    async fn update_product(
        &self,
        id: ProductId,
        update: UpdateProduct,
    ) -> Result<Option<Product>, StoreError>;

    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError>;

    // --- comments ---

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, StoreError>;

    async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>, StoreError>;

    async fn list_comments(&self) -> Result<Vec<Comment>, StoreError>;

    async fn comments_for_product(&self, id: ProductId) -> Result<Vec<Comment>, StoreError>;

    async fn update_comment(&self, id: CommentId, text: String) -> Result<Option<Comment>, StoreError>;

    async fn delete_comment(&self, id: CommentId) -> Result<bool, StoreError>;

    /// Owner of a comment, for owner-based access policies.
    async fn comment_owner(&self, id: CommentId) -> Result<Option<UserId>, StoreError> {
        Ok(self.get_comment(id).await?.map(|c| c.owner_id()))
    }

    /// Release backend resources. The store must not be used afterwards.
    async fn close(&self) {}
}
