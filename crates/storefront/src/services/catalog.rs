//! Catalog browsing and interaction.
//!
//! Every function takes the store handle explicitly and a plain request
//! value (identity, path parameters, payload), and returns a domain result.
//! Routes in [`crate::routes`] are thin adapters over these.

use thiserror::Error;
use tracing::instrument;

use catalog_core::{ProductId, Slug};

use crate::db::{CatalogStore, RepositoryError};
use crate::models::{Category, Comment, Product, ProductFilter, Requester};

/// Maximum length of a comment body, in characters.
pub const MAX_COMMENT_LENGTH: usize = 2000;

/// Warning shown when a requester likes the same product twice.
pub const DUPLICATE_LIKE_MESSAGE: &str = "You have already liked this product";

/// Errors returned by catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A slug or ID did not resolve.
    #[error("{0} not found")]
    NotFound(String),

    /// The submitted payload failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The feature has not been built.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    /// Store failure.
    #[error("store error: {0}")]
    Repository(#[from] RepositoryError),
}

// =============================================================================
// Catalog Listing
// =============================================================================

/// One row of the category list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryListing {
    pub name: String,
    pub slug: Slug,
    pub product_count: i64,
    /// Link to the category's listing page.
    pub url: String,
}

/// List every category with its current product count.
///
/// Empty categories are included with a count of zero.
///
/// # Errors
///
/// Returns `CatalogError::Repository` if the store query fails.
#[instrument(skip(store))]
pub async fn list_categories(
    store: &dyn CatalogStore,
) -> Result<Vec<CategoryListing>, CatalogError> {
    let summaries = store.category_summaries().await?;

    Ok(summaries
        .into_iter()
        .map(|summary| CategoryListing {
            url: summary.category.url(),
            name: summary.category.name,
            slug: summary.category.slug,
            product_count: summary.product_count,
        })
        .collect())
}

// =============================================================================
// Category / Product Resolution
// =============================================================================

/// Resolve a category from a URL slug.
///
/// A string that is not even a valid slug can never match, so it is
/// reported as `NotFound` rather than as bad input.
///
/// # Errors
///
/// Returns `CatalogError::NotFound` if no category has this slug.
pub async fn resolve_category(
    store: &dyn CatalogStore,
    category_slug: &str,
) -> Result<Category, CatalogError> {
    let not_found = || CatalogError::NotFound(format!("category {category_slug:?}"));
    let slug = Slug::parse(category_slug).map_err(|_| not_found())?;

    store.category_by_slug(&slug).await?.ok_or_else(not_found)
}

/// Resolve a product from its category slug and product slug.
///
/// The product must belong to the category named in the URL.
///
/// # Errors
///
/// Returns `CatalogError::NotFound` if the category does not exist or has no
/// product with this slug.
pub async fn resolve_product(
    store: &dyn CatalogStore,
    category_slug: &str,
    product_slug: &str,
) -> Result<(Category, Product), CatalogError> {
    let category = resolve_category(store, category_slug).await?;

    let not_found = || {
        CatalogError::NotFound(format!("product {product_slug:?} in category {category_slug:?}"))
    };
    let slug = Slug::parse(product_slug).map_err(|_| not_found())?;
    let product = store
        .product_in_category(category.id, &slug)
        .await?
        .ok_or_else(not_found)?;

    Ok((category, product))
}

/// Request for a category's product listing.
#[derive(Debug, Clone)]
pub struct CategoryRequest {
    pub category_slug: String,
    pub filter: ProductFilter,
}

/// A category and the products shown on its page.
#[derive(Debug, Clone)]
pub struct CategoryPage {
    pub category: Category,
    pub products: Vec<Product>,
}

/// Load a category page, applying price and "following" filters.
///
/// # Errors
///
/// Returns `CatalogError::InvalidInput` if `price_from` exceeds `price_to`,
/// and `CatalogError::NotFound` for an unknown category.
#[instrument(skip(store))]
pub async fn category_page(
    store: &dyn CatalogStore,
    request: CategoryRequest,
) -> Result<CategoryPage, CatalogError> {
    if let (Some(from), Some(to)) = (request.filter.price_from, request.filter.price_to)
        && from > to
    {
        return Err(CatalogError::InvalidInput(format!(
            "price_from ({from}) is greater than price_to ({to})"
        )));
    }

    let category = resolve_category(store, &request.category_slug).await?;
    let products = store
        .products_in_category(category.id, &request.filter)
        .await?;

    Ok(CategoryPage { category, products })
}

/// Request for a product detail page.
#[derive(Debug, Clone)]
pub struct ProductRequest {
    pub category_slug: String,
    pub product_slug: String,
    pub requester: Requester,
}

/// Everything shown on a product detail page.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub category: Category,
    pub product: Product,
    pub like_count: i64,
    pub liked_by_requester: bool,
    pub comments: Vec<Comment>,
}

/// Load a product detail page.
///
/// # Errors
///
/// Returns `CatalogError::NotFound` if the category or product does not
/// resolve, or the product belongs to another category.
#[instrument(skip(store))]
pub async fn product_page(
    store: &dyn CatalogStore,
    request: ProductRequest,
) -> Result<ProductPage, CatalogError> {
    let (category, product) =
        resolve_product(store, &request.category_slug, &request.product_slug).await?;

    let like_count = store.like_count(product.id).await?;
    let liked_by_requester = store.has_liked(product.id, request.requester).await?;
    let comments = store.comments_for_product(product.id).await?;

    Ok(ProductPage {
        category,
        product,
        like_count,
        liked_by_requester,
        comments,
    })
}

/// Look up a product by ID.
///
/// # Errors
///
/// Returns `CatalogError::NotFound` if the product does not exist.
pub async fn find_product(
    store: &dyn CatalogStore,
    product_id: ProductId,
) -> Result<Product, CatalogError> {
    store
        .product_by_id(product_id)
        .await?
        .ok_or_else(|| CatalogError::NotFound(format!("product {product_id}")))
}

// =============================================================================
// Likes
// =============================================================================

/// Request to like a product.
#[derive(Debug, Clone, Copy)]
pub struct LikeRequest {
    pub product_id: ProductId,
    pub requester: Requester,
}

/// Result of a like attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    /// A new like was stored.
    Liked,
    /// The requester had already liked the product; nothing changed.
    AlreadyLiked,
}

/// Outcome of [`like_product`] with the product's updated like total.
#[derive(Debug, Clone)]
pub struct LikeResult {
    pub product: Product,
    pub outcome: LikeOutcome,
    pub like_count: i64,
}

/// Like a product on behalf of a requester.
///
/// The store's uniqueness constraint decides duplicates: there is no read
/// before the write, so two concurrent requests from the same requester
/// produce exactly one `Liked` and one `AlreadyLiked`.
///
/// # Errors
///
/// Returns `CatalogError::NotFound` if the product does not exist.
#[instrument(skip(store))]
pub async fn like_product(
    store: &dyn CatalogStore,
    request: LikeRequest,
) -> Result<LikeResult, CatalogError> {
    let product = find_product(store, request.product_id).await?;

    let outcome = match store.insert_like(product.id, request.requester).await {
        Ok(like) => {
            tracing::info!(like_id = %like.id, product_id = %product.id, "Product liked");
            LikeOutcome::Liked
        }
        Err(RepositoryError::Conflict(_)) => {
            tracing::debug!(product_id = %product.id, "Duplicate like ignored");
            LikeOutcome::AlreadyLiked
        }
        Err(RepositoryError::NotFound) => {
            return Err(CatalogError::NotFound(format!("product {}", product.id)));
        }
        Err(e) => return Err(e.into()),
    };

    let like_count = store.like_count(product.id).await?;

    Ok(LikeResult {
        product,
        outcome,
        like_count,
    })
}

// =============================================================================
// Comments
// =============================================================================

/// A product and its comments, newest first.
#[derive(Debug, Clone)]
pub struct CommentList {
    pub product: Product,
    pub comments: Vec<Comment>,
}

/// List the comments on a product.
///
/// # Errors
///
/// Returns `CatalogError::NotFound` if the product does not exist.
#[instrument(skip(store))]
pub async fn list_comments(
    store: &dyn CatalogStore,
    product_id: ProductId,
) -> Result<CommentList, CatalogError> {
    let product = find_product(store, product_id).await?;
    let comments = store.comments_for_product(product.id).await?;

    Ok(CommentList { product, comments })
}

/// Request to add a comment.
#[derive(Debug, Clone)]
pub struct CommentRequest {
    pub product_id: ProductId,
    pub body: String,
}

/// Add a comment to a product.
///
/// The body is trimmed before validation and storage.
///
/// # Errors
///
/// Returns `CatalogError::InvalidInput` for an empty or overlong body and
/// `CatalogError::NotFound` if the product does not exist.
#[instrument(skip(store, request), fields(product_id = %request.product_id))]
pub async fn add_comment(
    store: &dyn CatalogStore,
    request: CommentRequest,
) -> Result<(Product, Comment), CatalogError> {
    let body = request.body.trim();
    if body.is_empty() {
        return Err(CatalogError::InvalidInput(
            "Comment cannot be empty".to_string(),
        ));
    }
    if body.chars().count() > MAX_COMMENT_LENGTH {
        return Err(CatalogError::InvalidInput(format!(
            "Comment must be at most {MAX_COMMENT_LENGTH} characters"
        )));
    }

    let product = find_product(store, request.product_id).await?;
    let comment = store
        .insert_comment(product.id, body)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => CatalogError::NotFound(format!("product {}", product.id)),
            other => other.into(),
        })?;

    tracing::info!(comment_id = %comment.id, "Comment added");
    Ok((product, comment))
}

// =============================================================================
// Cart
// =============================================================================

/// Add an item to the cart.
///
/// The cart has no backing implementation; every call fails, whatever the
/// payload.
///
/// # Errors
///
/// Always returns `CatalogError::NotImplemented`.
pub fn add_to_cart(_payload: &[u8]) -> Result<(), CatalogError> {
    Err(CatalogError::NotImplemented("adding to cart"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Arc;

    use catalog_core::UserId;

    use super::*;
    use crate::db::InMemoryStore;
    use crate::models::{NewCategory, NewProduct};

    fn slug(s: &str) -> Slug {
        Slug::parse(s).unwrap()
    }

    fn anonymous() -> Requester {
        Requester::Anonymous(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 7)))
    }

    async fn add_category(store: &InMemoryStore, name: &str, s: &str) -> Category {
        store
            .upsert_category(&NewCategory {
                name: name.to_string(),
                slug: slug(s),
            })
            .await
            .unwrap()
    }

    async fn add_product(
        store: &InMemoryStore,
        category: &Category,
        s: &str,
        price: &str,
    ) -> Product {
        store
            .upsert_product(&NewProduct {
                category_id: category.id,
                name: s.replace('-', " "),
                slug: slug(s),
                price: price.parse().unwrap(),
                description: String::new(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_categories_counts_products_including_empty() {
        let store = InMemoryStore::new();
        let teas = add_category(&store, "Teas", "teas").await;
        add_category(&store, "Accessories", "accessories").await;
        add_product(&store, &teas, "sencha", "8.50").await;
        add_product(&store, &teas, "assam", "6.00").await;
        add_product(&store, &teas, "darjeeling", "11.00").await;

        let listing = list_categories(&store).await.unwrap();

        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].name, "Accessories");
        assert_eq!(listing[0].product_count, 0);
        assert_eq!(listing[0].url, "/categories/accessories");
        assert_eq!(listing[1].name, "Teas");
        assert_eq!(listing[1].product_count, 3);
    }

    #[tokio::test]
    async fn test_list_categories_empty_catalog() {
        let store = InMemoryStore::new();
        assert!(list_categories(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_unknown_category_is_not_found() {
        let store = InMemoryStore::new();
        add_category(&store, "Teas", "teas").await;

        assert!(matches!(
            resolve_category(&store, "coffee").await,
            Err(CatalogError::NotFound(_))
        ));
        assert!(matches!(
            resolve_category(&store, "not a slug").await,
            Err(CatalogError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_product_requires_membership() {
        let store = InMemoryStore::new();
        let teas = add_category(&store, "Teas", "teas").await;
        add_category(&store, "Teapots", "teapots").await;
        add_product(&store, &teas, "sencha", "8.50").await;

        let (category, product) = resolve_product(&store, "teas", "sencha").await.unwrap();
        assert_eq!(category.id, teas.id);
        assert_eq!(product.category_id, teas.id);

        assert!(matches!(
            resolve_product(&store, "teapots", "sencha").await,
            Err(CatalogError::NotFound(_))
        ));
        assert!(matches!(
            resolve_product(&store, "coffee", "sencha").await,
            Err(CatalogError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_like_twice_reports_duplicate_and_keeps_one_like() {
        let store = InMemoryStore::new();
        let teas = add_category(&store, "Teas", "teas").await;
        let sencha = add_product(&store, &teas, "sencha", "8.50").await;
        let request = LikeRequest {
            product_id: sencha.id,
            requester: anonymous(),
        };

        let first = like_product(&store, request).await.unwrap();
        assert_eq!(first.outcome, LikeOutcome::Liked);
        assert_eq!(first.like_count, 1);

        let second = like_product(&store, request).await.unwrap();
        assert_eq!(second.outcome, LikeOutcome::AlreadyLiked);
        assert_eq!(second.like_count, 1);
        assert!(store.has_liked(sencha.id, anonymous()).await.unwrap());
    }

    #[tokio::test]
    async fn test_user_and_ip_likes_are_separate_scopes() {
        let store = InMemoryStore::new();
        let teas = add_category(&store, "Teas", "teas").await;
        let sencha = add_product(&store, &teas, "sencha", "8.50").await;

        for requester in [anonymous(), Requester::User(UserId::new(1))] {
            let result = like_product(
                &store,
                LikeRequest {
                    product_id: sencha.id,
                    requester,
                },
            )
            .await
            .unwrap();
            assert_eq!(result.outcome, LikeOutcome::Liked);
        }
        assert_eq!(store.like_count(sencha.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_likes_have_one_winner() {
        let store = Arc::new(InMemoryStore::new());
        let teas = add_category(&store, "Teas", "teas").await;
        let sencha = add_product(&store, &teas, "sencha", "8.50").await;
        let request = LikeRequest {
            product_id: sencha.id,
            requester: anonymous(),
        };

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { like_product(store.as_ref(), request).await })
            })
            .collect();

        let mut liked = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().outcome == LikeOutcome::Liked {
                liked += 1;
            }
        }
        assert_eq!(liked, 1);
        assert_eq!(store.like_count(sencha.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_like_unknown_product_is_not_found() {
        let store = InMemoryStore::new();
        let result = like_product(
            &store,
            LikeRequest {
                product_id: ProductId::new(404),
                requester: anonymous(),
            },
        )
        .await;
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_category_page_filters_by_price_and_following() {
        let store = InMemoryStore::new();
        let teas = add_category(&store, "Teas", "teas").await;
        let assam = add_product(&store, &teas, "assam", "6.00").await;
        add_product(&store, &teas, "sencha", "8.50").await;
        let darjeeling = add_product(&store, &teas, "darjeeling", "11.00").await;

        let page = category_page(
            &store,
            CategoryRequest {
                category_slug: "teas".to_string(),
                filter: ProductFilter {
                    price_from: Some("6.00".parse().unwrap()),
                    price_to: Some("8.50".parse().unwrap()),
                    liked_by: None,
                },
            },
        )
        .await
        .unwrap();
        let names: Vec<_> = page.products.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(names, ["assam", "sencha"]);

        for product in [&assam, &darjeeling] {
            store.insert_like(product.id, anonymous()).await.unwrap();
        }
        let following = category_page(
            &store,
            CategoryRequest {
                category_slug: "teas".to_string(),
                filter: ProductFilter {
                    liked_by: Some(anonymous()),
                    ..ProductFilter::default()
                },
            },
        )
        .await
        .unwrap();
        let names: Vec<_> = following.products.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(names, ["assam", "darjeeling"]);
    }

    #[tokio::test]
    async fn test_category_page_rejects_inverted_price_range() {
        let store = InMemoryStore::new();
        add_category(&store, "Teas", "teas").await;

        let result = category_page(
            &store,
            CategoryRequest {
                category_slug: "teas".to_string(),
                filter: ProductFilter {
                    price_from: Some("10".parse().unwrap()),
                    price_to: Some("5".parse().unwrap()),
                    liked_by: None,
                },
            },
        )
        .await;
        assert!(matches!(result, Err(CatalogError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_product_page_reports_like_state_and_comments() {
        let store = InMemoryStore::new();
        let teas = add_category(&store, "Teas", "teas").await;
        let sencha = add_product(&store, &teas, "sencha", "8.50").await;
        store.insert_like(sencha.id, anonymous()).await.unwrap();
        store.insert_comment(sencha.id, "Grassy.").await.unwrap();

        let page = product_page(
            &store,
            ProductRequest {
                category_slug: "teas".to_string(),
                product_slug: "sencha".to_string(),
                requester: anonymous(),
            },
        )
        .await
        .unwrap();
        assert_eq!(page.like_count, 1);
        assert!(page.liked_by_requester);
        assert_eq!(page.comments.len(), 1);

        let other = product_page(
            &store,
            ProductRequest {
                category_slug: "teas".to_string(),
                product_slug: "sencha".to_string(),
                requester: Requester::User(UserId::new(3)),
            },
        )
        .await
        .unwrap();
        assert!(!other.liked_by_requester);
    }

    #[tokio::test]
    async fn test_add_comment_trims_and_validates() {
        let store = InMemoryStore::new();
        let teas = add_category(&store, "Teas", "teas").await;
        let sencha = add_product(&store, &teas, "sencha", "8.50").await;

        let (_, comment) = add_comment(
            &store,
            CommentRequest {
                product_id: sencha.id,
                body: "  Lovely cup.  ".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(comment.body, "Lovely cup.");

        for body in ["   ".to_string(), "x".repeat(MAX_COMMENT_LENGTH + 1)] {
            let result = add_comment(
                &store,
                CommentRequest {
                    product_id: sencha.id,
                    body,
                },
            )
            .await;
            assert!(matches!(result, Err(CatalogError::InvalidInput(_))));
        }

        let listed = list_comments(&store, sencha.id).await.unwrap();
        assert_eq!(listed.comments.len(), 1);
    }

    #[tokio::test]
    async fn test_list_comments_unknown_product() {
        let store = InMemoryStore::new();
        assert!(matches!(
            list_comments(&store, ProductId::new(1)).await,
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn test_add_to_cart_is_never_implemented() {
        for payload in [&b""[..], b"product_id=1&quantity=2", b"{\"anything\":true}"] {
            assert!(matches!(
                add_to_cart(payload),
                Err(CatalogError::NotImplemented(_))
            ));
        }
    }
}
