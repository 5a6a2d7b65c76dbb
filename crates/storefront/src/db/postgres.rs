//! `PostgreSQL` implementation of the catalog and user stores.
//!
//! Queries use the runtime-checked `sqlx::query_as` API with `FromRow`
//! row types, so the crate builds without a live database.

use std::net::IpAddr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use catalog_core::{CategoryId, CommentId, LikeId, Price, ProductId, Slug, UserId, Username};

use super::{CatalogStore, RepositoryError, UserStore};
use crate::models::{
    Category, CategorySummary, Comment, Like, NewCategory, NewProduct, Product, ProductFilter,
    Requester, User,
};

const PRODUCT_COLUMNS: &str = r"
    p.id, p.category_id, c.slug AS category_slug, p.name, p.slug, p.price, p.description
";

/// Store backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// =============================================================================
// Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    slug: String,
}

#[derive(sqlx::FromRow)]
struct CategorySummaryRow {
    id: CategoryId,
    name: String,
    slug: String,
    product_count: i64,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    category_id: CategoryId,
    category_slug: String,
    name: String,
    slug: String,
    price: Price,
    description: String,
}

#[derive(sqlx::FromRow)]
struct LikeRow {
    id: LikeId,
    product_id: ProductId,
    user_id: Option<UserId>,
    ip: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: CommentId,
    product_id: ProductId,
    body: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    username: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

fn parse_slug(value: &str) -> Result<Slug, RepositoryError> {
    Slug::parse(value)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid slug {value:?}: {e}")))
}

impl TryFrom<CategoryRow> for Category {
    type Error = RepositoryError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            slug: parse_slug(&row.slug)?,
            name: row.name,
        })
    }
}

impl TryFrom<CategorySummaryRow> for CategorySummary {
    type Error = RepositoryError;

    fn try_from(row: CategorySummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            category: Category {
                id: row.id,
                slug: parse_slug(&row.slug)?,
                name: row.name,
            },
            product_count: row.product_count,
        })
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            category_id: row.category_id,
            category_slug: parse_slug(&row.category_slug)?,
            name: row.name,
            slug: parse_slug(&row.slug)?,
            price: row.price,
            description: row.description,
        })
    }
}

impl TryFrom<LikeRow> for Like {
    type Error = RepositoryError;

    fn try_from(row: LikeRow) -> Result<Self, Self::Error> {
        let owner = match (row.user_id, row.ip) {
            (Some(user_id), None) => Requester::User(user_id),
            (None, Some(ip)) => Requester::Anonymous(ip.parse::<IpAddr>().map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid ip on like {}: {e}", row.id))
            })?),
            _ => {
                return Err(RepositoryError::DataCorruption(format!(
                    "like {} must have exactly one of user_id or ip",
                    row.id
                )));
            }
        };

        Ok(Self {
            id: row.id,
            product_id: row.product_id,
            owner,
            created_at: row.created_at,
        })
    }
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            body: row.body,
            created_at: row.created_at,
        }
    }
}

impl UserRow {
    /// Split into the domain user and the stored password hash.
    fn into_user(self) -> Result<(User, String), RepositoryError> {
        let username = Username::parse(&self.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;

        Ok((
            User {
                id: self.id,
                username,
                created_at: self.created_at,
            },
            self.password_hash,
        ))
    }
}

/// Translate constraint violations on INSERT into repository errors.
///
/// A unique violation becomes `Conflict`; a foreign key violation means the
/// referenced row is gone and becomes `NotFound`.
fn map_write_error(e: sqlx::Error, conflict: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(conflict.to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound;
        }
    }
    RepositoryError::Database(e)
}

fn owner_columns(owner: Requester) -> (Option<UserId>, Option<String>) {
    (owner.user_id(), owner.ip().map(|ip| ip.to_string()))
}

// =============================================================================
// CatalogStore
// =============================================================================

#[async_trait]
impl CatalogStore for PgStore {
    async fn category_summaries(&self) -> Result<Vec<CategorySummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategorySummaryRow>(
            r"
            SELECT c.id, c.name, c.slug, COUNT(p.id) AS product_count
            FROM catalog.category c
            LEFT JOIN catalog.product p ON p.category_id = c.id
            GROUP BY c.id, c.name, c.slug
            ORDER BY c.name, c.id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CategorySummary::try_from).collect()
    }

    async fn category_by_slug(&self, slug: &Slug) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, slug
            FROM catalog.category
            WHERE slug = $1
            ",
        )
        .bind(slug.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Category::try_from).transpose()
    }

    async fn product_in_category(
        &self,
        category_id: CategoryId,
        slug: &Slug,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM catalog.product p
            JOIN catalog.category c ON c.id = p.category_id
            WHERE p.category_id = $1 AND p.slug = $2
            "
        ))
        .bind(category_id)
        .bind(slug.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM catalog.product p
            JOIN catalog.category c ON c.id = p.category_id
            WHERE p.id = $1
            "
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    async fn products_in_category(
        &self,
        category_id: CategoryId,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError> {
        let (liked_user, liked_ip) = filter.liked_by.map_or((None, None), owner_columns);

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM catalog.product p
            JOIN catalog.category c ON c.id = p.category_id
            WHERE p.category_id = $1
              AND ($2::numeric IS NULL OR p.price >= $2)
              AND ($3::numeric IS NULL OR p.price <= $3)
              AND (NOT $4 OR EXISTS (
                  SELECT 1 FROM catalog.product_like l
                  WHERE l.product_id = p.id AND (l.user_id = $5 OR l.ip = $6)
              ))
            ORDER BY p.name, p.id
            "
        ))
        .bind(category_id)
        .bind(filter.price_from)
        .bind(filter.price_to)
        .bind(filter.liked_by.is_some())
        .bind(liked_user)
        .bind(liked_ip)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    async fn insert_like(
        &self,
        product_id: ProductId,
        owner: Requester,
    ) -> Result<Like, RepositoryError> {
        let (user_id, ip) = owner_columns(owner);

        let row = sqlx::query_as::<_, LikeRow>(
            r"
            INSERT INTO catalog.product_like (product_id, user_id, ip)
            VALUES ($1, $2, $3)
            RETURNING id, product_id, user_id, ip, created_at
            ",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(ip)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "product already liked"))?;

        Like::try_from(row)
    }

    async fn like_count(&self, product_id: ProductId) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM catalog.product_like WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn has_liked(
        &self,
        product_id: ProductId,
        owner: Requester,
    ) -> Result<bool, RepositoryError> {
        let (user_id, ip) = owner_columns(owner);

        let exists = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1 FROM catalog.product_like
                WHERE product_id = $1 AND (user_id = $2 OR ip = $3)
            )
            ",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(ip)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn comments_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Comment>, RepositoryError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r"
            SELECT id, product_id, body, created_at
            FROM catalog.product_comment
            WHERE product_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn insert_comment(
        &self,
        product_id: ProductId,
        body: &str,
    ) -> Result<Comment, RepositoryError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r"
            INSERT INTO catalog.product_comment (product_id, body)
            VALUES ($1, $2)
            RETURNING id, product_id, body, created_at
            ",
        )
        .bind(product_id)
        .bind(body)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "duplicate comment"))?;

        Ok(Comment::from(row))
    }

    async fn upsert_category(&self, category: &NewCategory) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO catalog.category (name, slug)
            VALUES ($1, $2)
            ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, slug
            ",
        )
        .bind(&category.name)
        .bind(category.slug.as_str())
        .fetch_one(&self.pool)
        .await?;

        Category::try_from(row)
    }

    async fn upsert_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let id = sqlx::query_scalar::<_, ProductId>(
            r"
            INSERT INTO catalog.product (category_id, name, slug, price, description)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (category_id, slug) DO UPDATE
                SET name = EXCLUDED.name,
                    price = EXCLUDED.price,
                    description = EXCLUDED.description
            RETURNING id
            ",
        )
        .bind(product.category_id)
        .bind(&product.name)
        .bind(product.slug.as_str())
        .bind(product.price)
        .bind(&product.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "product slug already exists"))?;

        self.product_by_id(id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// =============================================================================
// UserStore
// =============================================================================

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO catalog.user_account (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash, created_at
            ",
        )
        .bind(username.as_str())
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "username already exists"))?;

        let (user, _) = row.into_user()?;
        Ok(user)
    }

    async fn user_with_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, password_hash, created_at
            FROM catalog.user_account
            WHERE username = $1
            ",
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }
}
