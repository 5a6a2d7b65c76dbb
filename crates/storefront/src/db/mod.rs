//! Data store access for the catalog.
//!
//! # Database
//!
//! ## Tables
//!
//! - `catalog.category` - Product categories (unique slug)
//! - `catalog.product` - Products, unique slug within a category
//! - `catalog.product_like` - One row per (product, user) or (product, ip)
//! - `catalog.product_comment` - Free-text comments
//! - `catalog.user_account` - Users with argon2 password hashes
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p catalog-cli -- migrate
//! ```
//!
//! # Stores
//!
//! Handlers never talk to sqlx directly; they receive a [`CatalogStore`] /
//! [`UserStore`] handle from [`AppState`](crate::state::AppState).
//! [`PgStore`] is the production implementation, [`InMemoryStore`] backs
//! unit and router tests.

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use catalog_core::{CategoryId, ProductId, Slug, Username};

use crate::models::{
    Category, CategorySummary, Comment, Like, NewCategory, NewProduct, Product, ProductFilter,
    Requester, User,
};

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., a second like from the same requester).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Read and write access to categories, products, likes and comments.
///
/// Every read goes to the store; nothing is cached between calls.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All categories with their product counts, ordered by name.
    ///
    /// Categories without products are included with a count of zero.
    async fn category_summaries(&self) -> Result<Vec<CategorySummary>, RepositoryError>;

    /// Look up a category by slug.
    async fn category_by_slug(&self, slug: &Slug) -> Result<Option<Category>, RepositoryError>;

    /// Look up a product by slug, restricted to one category.
    async fn product_in_category(
        &self,
        category_id: CategoryId,
        slug: &Slug,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Look up a product by ID.
    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// A category's products matching `filter`, ordered by name.
    async fn products_in_category(
        &self,
        category_id: CategoryId,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError>;

    /// Record a like.
    ///
    /// Returns `RepositoryError::Conflict` if `owner` already liked the product
    /// and `RepositoryError::NotFound` if the product does not exist.
    async fn insert_like(
        &self,
        product_id: ProductId,
        owner: Requester,
    ) -> Result<Like, RepositoryError>;

    /// Total number of likes on a product.
    async fn like_count(&self, product_id: ProductId) -> Result<i64, RepositoryError>;

    /// Whether `owner` has liked the product.
    async fn has_liked(
        &self,
        product_id: ProductId,
        owner: Requester,
    ) -> Result<bool, RepositoryError>;

    /// Comments on a product, newest first.
    async fn comments_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Comment>, RepositoryError>;

    /// Store a comment.
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    async fn insert_comment(
        &self,
        product_id: ProductId,
        body: &str,
    ) -> Result<Comment, RepositoryError>;

    /// Create a category, or rename the one that already has this slug.
    async fn upsert_category(&self, category: &NewCategory) -> Result<Category, RepositoryError>;

    /// Create a product, or update the one with this slug in the same category.
    async fn upsert_product(&self, product: &NewProduct) -> Result<Product, RepositoryError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Access to storefront user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user.
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken.
    async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError>;

    /// Get a user and their password hash by username.
    async fn user_with_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
