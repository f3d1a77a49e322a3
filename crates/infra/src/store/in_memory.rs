use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use storefront_catalog::{
    Comment, CreateProduct, DEFAULT_SEARCH_LIMIT, NewComment, NewUser, Product, UpdateProduct,
    User, UserCredentials, UserUpdate,
};
use storefront_core::{CommentId, ProductId, UserId};

use super::r#trait::{Store, StoreError};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, UserCredentials>,
    products: BTreeMap<ProductId, Product>,
    comments: BTreeMap<CommentId, Comment>,
    last_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|c| c.user.email == email && Some(c.user.id) != except)
    }
}

/// In-memory store.
///
/// Intended for tests/dev. Ids come from one counter shared by all tables.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.write()?;
        if tables.email_taken(&user.email, None) {
            return Err(StoreError::Conflict(format!("email {} already registered", user.email)));
        }

        let now = Utc::now();
        let id = UserId::new(tables.next_id());
        let created = User {
            id,
            username: user.username,
            email: user.email,
            is_admin: false,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(
            id,
            UserCredentials {
                user: created.clone(),
                password_hash: user.password_hash,
            },
        );
        Ok(created)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.get(&id).map(|c| c.user.clone()))
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, StoreError> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|c| c.user.email == email)
            .cloned())
    }

    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<Option<User>, StoreError> {
        let mut tables = self.write()?;
        if let Some(email) = &update.email {
            if tables.email_taken(email, Some(id)) {
                return Err(StoreError::Conflict(format!("email {email} already registered")));
            }
        }

        let Some(creds) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = update.username {
            creds.user.username = username;
        }
        if let Some(email) = update.email {
            creds.user.email = email;
        }
        if let Some(hash) = update.password_hash {
            creds.password_hash = hash;
        }
        creds.user.updated_at = Utc::now();
        Ok(Some(creds.user.clone()))
    }

    async fn set_admin(&self, id: UserId, is_admin: bool) -> Result<Option<User>, StoreError> {
        let mut tables = self.write()?;
        Ok(tables.users.get_mut(&id).map(|creds| {
            creds.user.is_admin = is_admin;
            creds.user.updated_at = Utc::now();
            creds.user.clone()
        }))
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        tables.comments.retain(|_, c| c.user_id != id);
        Ok(true)
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.read()?.products.values().cloned().collect())
    }

    async fn count_products(&self) -> Result<u64, StoreError> {
        Ok(self.read()?.products.len() as u64)
    }

    async fn search_products(&self, query: Option<&str>) -> Result<Vec<Product>, StoreError> {
        let tables = self.read()?;
        let products = tables.products.values();
        Ok(match query {
            Some(q) => products.filter(|p| p.matches_search(q)).cloned().collect(),
            None => products.take(DEFAULT_SEARCH_LIMIT).cloned().collect(),
        })
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn create_product(&self, product: CreateProduct) -> Result<Product, StoreError> {
        let mut tables = self.write()?;
        let now = Utc::now();
        let id = ProductId::new(tables.next_id());
        let created = Product {
            id,
            title: product.title,
            description: product.description,
            category: product.category,
            brand: product.brand,
            image: product.image,
            price: product.price,
            created_at: now,
            updated_at: now,
        };
        tables.products.insert(id, created.clone());
        Ok(created)
    }

    async fn update_product(
        &self,
        id: ProductId,
        update: UpdateProduct,
    ) -> Result<Option<Product>, StoreError> {
        let mut tables = self.write()?;
        Ok(tables.products.get_mut(&id).map(|p| {
            p.apply(&update, Utc::now());
            p.clone()
        }))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        if tables.products.remove(&id).is_none() {
            return Ok(false);
        }
        tables.comments.retain(|_, c| c.product_id != id);
        Ok(true)
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let mut tables = self.write()?;
        if !tables.products.contains_key(&comment.product_id) {
            return Err(StoreError::MissingReference(format!(
                "product {} does not exist",
                comment.product_id
            )));
        }
        if !tables.users.contains_key(&comment.user_id) {
            return Err(StoreError::MissingReference(format!(
                "user {} does not exist",
                comment.user_id
            )));
        }

        let now = Utc::now();
        let id = CommentId::new(tables.next_id());
        let created = Comment {
            id,
            text: comment.text,
            product_id: comment.product_id,
            user_id: comment.user_id,
            created_at: now,
            updated_at: now,
        };
        tables.comments.insert(id, created.clone());
        Ok(created)
    }

    async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>, StoreError> {
        Ok(self.read()?.comments.get(&id).cloned())
    }

    async fn list_comments(&self) -> Result<Vec<Comment>, StoreError> {
        Ok(self.read()?.comments.values().cloned().collect())
    }

    async fn comments_for_product(&self, id: ProductId) -> Result<Vec<Comment>, StoreError> {
        Ok(self
            .read()?
            .comments
            .values()
            .filter(|c| c.product_id == id)
            .cloned()
            .collect())
    }

    async fn update_comment(&self, id: CommentId, text: String) -> Result<Option<Comment>, StoreError> {
        let mut tables = self.write()?;
        Ok(tables.comments.get_mut(&id).map(|c| {
            c.text = text;
            c.updated_at = Utc::now();
            c.clone()
        }))
    }

    async fn delete_comment(&self, id: CommentId) -> Result<bool, StoreError> {
        Ok(self.write()?.comments.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{name}@shop.io"),
            password_hash: "$argon2id$placeholder".to_string(),
        }
    }

    fn new_product(title: &str) -> CreateProduct {
        CreateProduct {
            title: title.to_string(),
            description: "A fine product indeed".to_string(),
            category: "misc".to_string(),
            brand: "Acme".to_string(),
            image: "/img/x.png".to_string(),
            price: 10.0,
        }
    }

    #[tokio::test]
    async fn emails_are_unique() {
        let store = InMemoryStore::new();
        store.create_user(new_user("alice")).await.unwrap();

        let err = store.create_user(new_user("alice")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn new_users_are_not_admins_until_promoted() {
        let store = InMemoryStore::new();
        let user = store.create_user(new_user("bob")).await.unwrap();
        assert!(!user.is_admin);

        let promoted = store.set_admin(user.id, true).await.unwrap().unwrap();
        assert!(promoted.is_admin);

        let creds = store.find_credentials_by_email("bob@shop.io").await.unwrap().unwrap();
        assert!(creds.user.is_admin);
        assert_eq!(creds.password_hash, "$argon2id$placeholder");
    }

    #[tokio::test]
    async fn deleting_a_user_removes_their_comments() {
        let store = InMemoryStore::new();
        let alice = store.create_user(new_user("alice")).await.unwrap();
        let bob = store.create_user(new_user("bob")).await.unwrap();
        let product = store.create_product(new_product("Kettle")).await.unwrap();

        let mine = store
            .create_comment(NewComment { text: "lovely".into(), product_id: product.id, user_id: alice.id })
            .await
            .unwrap();
        let theirs = store
            .create_comment(NewComment { text: "so so".into(), product_id: product.id, user_id: bob.id })
            .await
            .unwrap();

        assert!(store.delete_user(alice.id).await.unwrap());
        assert!(store.get_comment(mine.id).await.unwrap().is_none());
        assert_eq!(store.comment_owner(theirs.id).await.unwrap(), Some(bob.id));
        assert!(!store.delete_user(alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn deleting_a_product_removes_its_comments() {
        let store = InMemoryStore::new();
        let alice = store.create_user(new_user("alice")).await.unwrap();
        let product = store.create_product(new_product("Kettle")).await.unwrap();
        let comment = store
            .create_comment(NewComment { text: "lovely".into(), product_id: product.id, user_id: alice.id })
            .await
            .unwrap();

        assert!(store.delete_product(product.id).await.unwrap());
        assert!(store.get_comment(comment.id).await.unwrap().is_none());
        assert_eq!(store.count_products().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn comments_require_existing_product() {
        let store = InMemoryStore::new();
        let alice = store.create_user(new_user("alice")).await.unwrap();
        let err = store
            .create_comment(NewComment { text: "hello".into(), product_id: ProductId::new(99), user_id: alice.id })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingReference(_)));
    }

    #[tokio::test]
    async fn search_matches_titles_or_returns_first_page() {
        let store = InMemoryStore::new();
        for i in 0..8 {
            store.create_product(new_product(&format!("Lamp {i}"))).await.unwrap();
        }
        store.create_product(new_product("Desk LAMP")).await.unwrap();
        store.create_product(new_product("Chair")).await.unwrap();

        assert_eq!(store.search_products(Some("lamp")).await.unwrap().len(), 9);
        assert_eq!(store.search_products(Some("chair")).await.unwrap().len(), 1);
        assert_eq!(
            store.search_products(None).await.unwrap().len(),
            DEFAULT_SEARCH_LIMIT
        );
    }

    #[tokio::test]
    async fn update_user_rejects_taken_email() {
        let store = InMemoryStore::new();
        let alice = store.create_user(new_user("alice")).await.unwrap();
        store.create_user(new_user("bob")).await.unwrap();

        let err = store
            .update_user(alice.id, UserUpdate { email: Some("bob@shop.io".into()), ..UserUpdate::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // Keeping your own email is fine.
        let same = store
            .update_user(alice.id, UserUpdate { email: Some("alice@shop.io".into()), ..UserUpdate::default() })
            .await
            .unwrap();
        assert!(same.is_some());
    }

    #[tokio::test]
    async fn comment_owner_tracks_author_and_missing_rows() {
        let store = InMemoryStore::new();
        let alice = store.create_user(new_user("alice")).await.unwrap();
        let product = store.create_product(new_product("Kettle")).await.unwrap();
        let comment = store
            .create_comment(NewComment { text: "lovely".into(), product_id: product.id, user_id: alice.id })
            .await
            .unwrap();

        assert_eq!(store.comment_owner(comment.id).await.unwrap(), Some(alice.id));
        assert_eq!(store.comment_owner(CommentId::new(4242)).await.unwrap(), None);

        assert!(store.delete_comment(comment.id).await.unwrap());
        assert_eq!(store.comment_owner(comment.id).await.unwrap(), None);
    }
}
