//! Category route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use tracing::instrument;

use catalog_core::Price;

use super::page::{ActiveTab, CategoryView, PageContext, ProductView};
use crate::error::{AppError, Result};
use crate::middleware::{Flash, OptionalAuth};
use crate::models::{ProductFilter, Requester};
use crate::services::catalog::{self, CategoryRequest};
use crate::state::AppState;

/// Category page filter parameters.
///
/// Empty values (as submitted by a blank form field) mean "no filter".
#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    pub price_from: Option<String>,
    pub price_to: Option<String>,
    pub following: Option<String>,
}

impl CategoryQuery {
    /// Turn the raw query into a product filter for `requester`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for an unparsable price.
    pub fn into_filter(self, requester: Requester) -> Result<ProductFilter> {
        let following = self
            .following
            .as_deref()
            .is_some_and(|v| matches!(v.trim(), "1" | "true" | "on" | "yes"));

        Ok(ProductFilter {
            price_from: parse_price("price_from", self.price_from.as_deref())?,
            price_to: parse_price("price_to", self.price_to.as_deref())?,
            liked_by: following.then_some(requester),
        })
    }
}

fn parse_price(field: &str, value: Option<&str>) -> Result<Option<Price>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<Price>()
            .map(Some)
            .map_err(|e| AppError::BadRequest(format!("{field}: {e}"))),
    }
}

/// Category listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub page: PageContext,
    pub categories: Vec<CategoryView>,
}

/// Category detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/show.html")]
pub struct CategoryShowTemplate {
    pub page: PageContext,
    pub name: String,
    pub url: String,
    pub products: Vec<ProductView>,
    pub price_from: String,
    pub price_to: String,
    pub following: bool,
}

/// Display every category with its product count.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    auth: OptionalAuth,
    flash: Flash,
) -> Result<CategoriesIndexTemplate> {
    let categories = catalog::list_categories(state.catalog()).await?;

    Ok(CategoriesIndexTemplate {
        page: PageContext::new(ActiveTab::CategoryList, flash, auth),
        categories: categories.into_iter().map(CategoryView::from).collect(),
    })
}

/// Display one category's products, optionally filtered.
#[instrument(skip(state, auth, flash, requester))]
pub async fn show(
    State(state): State<AppState>,
    Path(category_slug): Path<String>,
    Query(query): Query<CategoryQuery>,
    requester: Requester,
    auth: OptionalAuth,
    flash: Flash,
) -> Result<CategoryShowTemplate> {
    let price_from = query.price_from.clone().unwrap_or_default();
    let price_to = query.price_to.clone().unwrap_or_default();
    let filter = query.into_filter(requester)?;
    let following = filter.liked_by.is_some();

    let page = catalog::category_page(
        state.catalog(),
        CategoryRequest {
            category_slug,
            filter,
        },
    )
    .await?;

    Ok(CategoryShowTemplate {
        page: PageContext::new(ActiveTab::CategoryList, flash, auth),
        url: page.category.url(),
        name: page.category.name,
        products: page.products.iter().map(ProductView::from).collect(),
        price_from,
        price_to,
        following,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    fn requester() -> Requester {
        Requester::Anonymous(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }

    #[test]
    fn test_empty_query_is_unfiltered() {
        let filter = CategoryQuery {
            price_from: Some(String::new()),
            price_to: Some("  ".to_string()),
            following: None,
        }
        .into_filter(requester())
        .unwrap();

        assert!(filter.price_from.is_none());
        assert!(filter.price_to.is_none());
        assert!(filter.liked_by.is_none());
    }

    #[test]
    fn test_following_scopes_to_requester() {
        let filter = CategoryQuery {
            following: Some("1".to_string()),
            ..CategoryQuery::default()
        }
        .into_filter(requester())
        .unwrap();
        assert_eq!(filter.liked_by, Some(requester()));
    }

    #[test]
    fn test_unparsable_price_is_bad_request() {
        let result = CategoryQuery {
            price_from: Some("cheap".to_string()),
            ..CategoryQuery::default()
        }
        .into_filter(requester());
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
