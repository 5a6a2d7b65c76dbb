//! Catalog domain types: categories, products, likes and comments.

use chrono::{DateTime, Utc};

use catalog_core::{CategoryId, CommentId, LikeId, Price, ProductId, Slug};

use super::Requester;

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: Slug,
}

impl Category {
    /// Path of the category listing page.
    #[must_use]
    pub fn url(&self) -> String {
        category_url(&self.slug)
    }
}

/// A category together with the number of products currently assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySummary {
    pub category: Category,
    pub product_count: i64,
}

/// A product, always belonging to exactly one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    /// Slug of the owning category, carried along to build URLs.
    pub category_slug: Slug,
    pub name: String,
    pub slug: Slug,
    pub price: Price,
    pub description: String,
}

impl Product {
    /// Path of the product detail page.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}/{}", category_url(&self.category_slug), self.slug)
    }
}

/// A recorded approval of a product by one requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Like {
    pub id: LikeId,
    pub product_id: ProductId,
    pub owner: Requester,
    pub created_at: DateTime<Utc>,
}

/// A free-text comment on a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: CommentId,
    pub product_id: ProductId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating or updating a category, keyed by slug.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub slug: Slug,
}

/// Input for creating or updating a product, keyed by (category, slug).
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub category_id: CategoryId,
    pub name: String,
    pub slug: Slug,
    pub price: Price,
    pub description: String,
}

/// Restrictions applied when listing a category's products.
///
/// Bounds are inclusive. `liked_by` keeps only products that requester liked.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub price_from: Option<Price>,
    pub price_to: Option<Price>,
    pub liked_by: Option<Requester>,
}

impl ProductFilter {
    /// Whether a product's price falls inside the configured bounds.
    #[must_use]
    pub fn price_matches(&self, price: Price) -> bool {
        self.price_from.is_none_or(|from| price >= from)
            && self.price_to.is_none_or(|to| price <= to)
    }
}

fn category_url(slug: &Slug) -> String {
    format!("/categories/{slug}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product {
            id: ProductId::new(5),
            category_id: CategoryId::new(1),
            category_slug: Slug::parse("teapots").unwrap(),
            name: "Cast Iron Teapot".to_string(),
            slug: Slug::parse("cast-iron").unwrap(),
            price: "45.00".parse().unwrap(),
            description: String::new(),
        }
    }

    #[test]
    fn test_product_url_nests_under_category() {
        assert_eq!(product().url(), "/categories/teapots/cast-iron");
    }

    #[test]
    fn test_price_filter_bounds_are_inclusive() {
        let filter = ProductFilter {
            price_from: Some("10".parse().unwrap()),
            price_to: Some("45".parse().unwrap()),
            liked_by: None,
        };
        assert!(filter.price_matches("10.00".parse().unwrap()));
        assert!(filter.price_matches(product().price));
        assert!(!filter.price_matches("45.01".parse().unwrap()));
        assert!(!filter.price_matches("9.99".parse().unwrap()));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(ProductFilter::default().price_matches(Price::ZERO));
    }
}
