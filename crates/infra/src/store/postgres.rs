//! Postgres-backed store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (foreign key violation) | `23503` | `MissingReference` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / Io / Tls / other | N/A | `Backend` |
//!
//! Comments reference users and products with `ON DELETE CASCADE`, so deleting
//! either removes the dependent comments in the same statement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;

use storefront_catalog::{
    Comment, CreateProduct, DEFAULT_SEARCH_LIMIT, NewComment, NewUser, Product, UpdateProduct,
    User, UserCredentials, UserUpdate,
};
use storefront_core::{CommentId, ProductId, UserId};

use super::r#trait::{Store, StoreError};

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id            BIGSERIAL PRIMARY KEY,
        username      TEXT NOT NULL,
        email         TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        is_admin      BOOLEAN NOT NULL DEFAULT FALSE,
        created_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at    TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id          BIGSERIAL PRIMARY KEY,
        title       TEXT NOT NULL,
        description TEXT NOT NULL,
        category    TEXT NOT NULL,
        brand       TEXT NOT NULL,
        image       TEXT NOT NULL,
        price       DOUBLE PRECISION NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id         BIGSERIAL PRIMARY KEY,
        text       TEXT NOT NULL,
        product_id BIGINT NOT NULL REFERENCES products(id) ON DELETE CASCADE,
        user_id    BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];

const USER_COLUMNS: &str = "id, username, email, password_hash, is_admin, created_at, updated_at";
const PRODUCT_COLUMNS: &str =
    "id, title, description, category, brand, image, price, created_at, updated_at";
const COMMENT_COLUMNS: &str = "id, text, product_id, user_id, created_at, updated_at";

/// Postgres-backed store over an SQLx connection pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the tables if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl Store for PostgresStore {
    #[instrument(skip(self, user), fields(email = %user.email), err)]
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query(&format!(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?;

        Ok(user_from_row(&row)?.user)
    }

    #[instrument(skip(self), err)]
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?;

        row.map(|r| user_from_row(&r).map(|c| c.user)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_credentials_by_email", e))?;

        row.map(|r| user_from_row(&r)).transpose()
    }

    #[instrument(skip(self, update), err)]
    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id.get())
        .bind(update.username)
        .bind(update.email)
        .bind(update.password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?;

        row.map(|r| user_from_row(&r).map(|c| c.user)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn set_admin(&self, id: UserId, is_admin: bool) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE users SET is_admin = $2, updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id.get())
        .bind(is_admin)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_admin", e))?;

        row.map(|r| user_from_row(&r).map(|c| c.user)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;

        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn count_products(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_products", e))?;
        Ok(count.max(0) as u64)
    }

    #[instrument(skip(self), err)]
    async fn search_products(&self, query: Option<&str>) -> Result<Vec<Product>, StoreError> {
        let rows = match query {
            Some(q) => {
                sqlx::query(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products WHERE title ILIKE $1 ORDER BY id"
                ))
                .bind(format!("%{}%", escape_like(q)))
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id LIMIT $1"
                ))
                .bind(DEFAULT_SEARCH_LIMIT as i64)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| map_sqlx_error("search_products", e))?;

        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?;

        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self, product), fields(title = %product.title), err)]
    async fn create_product(&self, product: CreateProduct) -> Result<Product, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products (title, description, category, brand, image, price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&product.title)
        .bind(&product.description)
        .bind(&product.category)
        .bind(&product.brand)
        .bind(&product.image)
        .bind(product.price)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_product", e))?;

        product_from_row(&row)
    }

    #[instrument(skip(self, update), err)]
    async fn update_product(
        &self,
        id: ProductId,
        update: UpdateProduct,
    ) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE products SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                brand = COALESCE($5, brand),
                image = COALESCE($6, image),
                price = COALESCE($7, price),
                updated_at = now()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id.get())
        .bind(update.title)
        .bind(update.description)
        .bind(update.category)
        .bind(update.brand)
        .bind(update.image)
        .bind(update.price)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;

        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, comment), fields(product_id = %comment.product_id, user_id = %comment.user_id), err)]
    async fn create_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let row = sqlx::query(&format!(
            "INSERT INTO comments (text, product_id, user_id) VALUES ($1, $2, $3) RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(&comment.text)
        .bind(comment.product_id.get())
        .bind(comment.user_id.get())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_comment", e))?;

        comment_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>, StoreError> {
        let row = sqlx::query(&format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_comment", e))?;

        row.as_ref().map(comment_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_comments(&self) -> Result<Vec<Comment>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {COMMENT_COLUMNS} FROM comments ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_comments", e))?;

        rows.iter().map(comment_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn comments_for_product(&self, id: ProductId) -> Result<Vec<Comment>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE product_id = $1 ORDER BY id"
        ))
        .bind(id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("comments_for_product", e))?;

        rows.iter().map(comment_from_row).collect()
    }

    #[instrument(skip(self, text), err)]
    async fn update_comment(&self, id: CommentId, text: String) -> Result<Option<Comment>, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE comments SET text = $2, updated_at = now() WHERE id = $1 RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(id.get())
        .bind(text)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_comment", e))?;

        row.as_ref().map(comment_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn delete_comment(&self, id: CommentId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_comment", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn comment_owner(&self, id: CommentId) -> Result<Option<UserId>, StoreError> {
        let owner: Option<i64> = sqlx::query_scalar("SELECT user_id FROM comments WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("comment_owner", e))?;
        Ok(owner.map(UserId::new))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Escape `LIKE` wildcards so the query is matched literally.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for ch in query.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("23503") => StoreError::MissingReference(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

fn decode_error(err: sqlx::Error) -> StoreError {
    StoreError::Backend(format!("failed to decode row: {err}"))
}

// SQLx row mapping

fn user_from_row(row: &PgRow) -> Result<UserCredentials, StoreError> {
    let read = || -> Result<UserCredentials, sqlx::Error> {
        Ok(UserCredentials {
            user: User {
                id: UserId::new(row.try_get("id")?),
                username: row.try_get("username")?,
                email: row.try_get("email")?,
                is_admin: row.try_get("is_admin")?,
                created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
                updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
            },
            password_hash: row.try_get("password_hash")?,
        })
    };
    read().map_err(decode_error)
}

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    let read = || -> Result<Product, sqlx::Error> {
        Ok(Product {
            id: ProductId::new(row.try_get("id")?),
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            category: row.try_get("category")?,
            brand: row.try_get("brand")?,
            image: row.try_get("image")?,
            price: row.try_get("price")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    };
    read().map_err(decode_error)
}

fn comment_from_row(row: &PgRow) -> Result<Comment, StoreError> {
    let read = || -> Result<Comment, sqlx::Error> {
        Ok(Comment {
            id: CommentId::new(row.try_get("id")?),
            text: row.try_get("text")?,
            product_id: ProductId::new(row.try_get("product_id")?),
            user_id: UserId::new(row.try_get("user_id")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    };
    read().map_err(decode_error)
}
