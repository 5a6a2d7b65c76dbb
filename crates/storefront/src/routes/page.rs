//! Data shared by every rendered page, and display types for templates.
//!
//! Templates receive pre-formatted strings only; no domain types leak into
//! Askama.

use axum::http::HeaderMap;
use serde::Serialize;

use crate::middleware::{Flash, OptionalAuth};
use crate::models::{Comment, FlashMessage, Product};
use crate::services::catalog::CategoryListing;

/// Navigation entry highlighted in the site header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveTab {
    CategoryList,
    ProductDetail,
    Cart,
    Login,
}

impl ActiveTab {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CategoryList => "category_list",
            Self::ProductDetail => "product_detail",
            Self::Cart => "cart",
            Self::Login => "login",
        }
    }
}

/// Flash message display data.
#[derive(Debug, Clone)]
pub struct MessageView {
    pub level: &'static str,
    pub text: String,
}

impl From<FlashMessage> for MessageView {
    fn from(message: FlashMessage) -> Self {
        Self {
            level: message.level.as_str(),
            text: message.text,
        }
    }
}

/// Layout data: active tab, pending flash messages and the logged-in user.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub active_tab: &'static str,
    pub messages: Vec<MessageView>,
    pub username: Option<String>,
}

impl PageContext {
    #[must_use]
    pub fn new(tab: ActiveTab, Flash(messages): Flash, OptionalAuth(user): OptionalAuth) -> Self {
        Self {
            active_tab: tab.as_str(),
            messages: messages.into_iter().map(MessageView::from).collect(),
            username: user.map(|u| u.username.to_string()),
        }
    }

    /// Whether `tab` is the highlighted navigation entry.
    #[must_use]
    pub fn is_active(&self, tab: &str) -> bool {
        self.active_tab == tab
    }
}

/// Category display data for templates.
#[derive(Debug, Clone)]
pub struct CategoryView {
    pub name: String,
    pub url: String,
    pub product_count: i64,
}

impl From<CategoryListing> for CategoryView {
    fn from(listing: CategoryListing) -> Self {
        Self {
            name: listing.name,
            url: listing.url,
            product_count: listing.product_count,
        }
    }
}

/// Product display data for templates.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub price: String,
    pub description: String,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i64(),
            name: product.name.clone(),
            url: product.url(),
            price: format!("${}", product.price),
            description: product.description.clone(),
        }
    }
}

/// Comment display and JSON data.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub body: String,
    /// RFC 3339 timestamp.
    pub created_at: String,
    /// Human-readable timestamp.
    pub posted: String,
}

impl From<&Comment> for CommentView {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id.as_i64(),
            body: comment.body.clone(),
            created_at: comment.created_at.to_rfc3339(),
            posted: comment.created_at.format("%b %-d, %Y %H:%M").to_string(),
        }
    }
}

/// Whether the client asked for a JSON fragment instead of a page.
///
/// True for `X-Requested-With: XMLHttpRequest`, `HX-Request`, or an
/// `Accept` header naming `application/json`.
#[must_use]
pub fn wants_json(headers: &HeaderMap) -> bool {
    let header_str = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    header_str("x-requested-with").is_some_and(|v| v.eq_ignore_ascii_case("xmlhttprequest"))
        || headers.contains_key("hx-request")
        || header_str("accept").is_some_and(|v| v.contains("application/json"))
}
