//! Integration tests for the catalog storefront.
//!
//! # Running Tests
//!
//! ```bash
//! # Router tests (in-memory stores, no services needed)
//! cargo test -p catalog-integration-tests
//!
//! # PostgreSQL store tests
//! TEST_DATABASE_URL=postgres://localhost/catalog_test \
//!     cargo test -p catalog-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `routes` - Full router with middleware, driven with `oneshot`
//! - `postgres_store` - `PgStore` against a real database

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{Request, Response, header},
};
use secrecy::SecretString;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use catalog_core::Slug;
use catalog_storefront::app::build_app;
use catalog_storefront::config::{LogFormat, SentryConfig, StorefrontConfig};
use catalog_storefront::db::{CatalogStore, InMemoryStore};
use catalog_storefront::models::{Category, NewCategory, NewProduct, Product};
use catalog_storefront::state::AppState;

/// Address every test request appears to come from.
pub const CLIENT_ADDR: ([u8; 4], u16) = ([203, 0, 113, 7], 41_000);

/// Configuration suitable for tests; the database URL is never used.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/unused"),
        host: "127.0.0.1".parse().unwrap(),
        port: 8000,
        base_url: "http://localhost:8000".to_string(),
        trust_forwarded_for: false,
        session_secure: false,
        log_format: LogFormat::Pretty,
        sentry: SentryConfig::default(),
    }
}

/// A router over in-memory stores, plus handles for seeding and asserting.
pub struct TestContext {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub teas: Category,
    pub teapots: Category,
    pub sencha: Product,
    pub assam: Product,
    pub darjeeling: Product,
}

impl TestContext {
    /// Build the app with two categories: "Teas" with three products and
    /// an empty "Teapots".
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());

        let teas = add_category(&store, "Teas", "teas").await;
        let teapots = add_category(&store, "Teapots", "teapots").await;
        let sencha = add_product(&store, &teas, "Sencha", "8.50").await;
        let assam = add_product(&store, &teas, "Assam", "6.00").await;
        let darjeeling = add_product(&store, &teas, "Darjeeling", "11.00").await;

        let state = AppState::new(test_config(), store.clone(), store.clone());
        let router = build_app(state, MemoryStore::default())
            .layer(MockConnectInfo(SocketAddr::from(CLIENT_ADDR)));

        Self {
            router,
            store,
            teas,
            teapots,
            sencha,
            assam,
            darjeeling,
        }
    }

    /// Send one request through the full middleware stack.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// `GET path`, optionally with a session cookie.
    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::get(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// `POST path` with a urlencoded form body.
    pub async fn post_form(
        &self,
        path: &str,
        form: &str,
        extra_headers: &[(&str, &str)],
    ) -> Response<Body> {
        let mut builder = Request::post(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        for (name, value) in extra_headers {
            builder = builder.header(*name, *value);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap())
            .await
    }
}

async fn add_category(store: &InMemoryStore, name: &str, slug: &str) -> Category {
    store
        .upsert_category(&NewCategory {
            name: name.to_string(),
            slug: Slug::parse(slug).unwrap(),
        })
        .await
        .unwrap()
}

async fn add_product(store: &InMemoryStore, category: &Category, name: &str, price: &str) -> Product {
    store
        .upsert_product(&NewProduct {
            category_id: category.id,
            name: name.to_string(),
            slug: Slug::slugify(name).unwrap(),
            price: price.parse().unwrap(),
            description: format!("{name} tea."),
        })
        .await
        .unwrap()
}

/// Collect a response body into a string.
pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// The `name=value` part of the session cookie set by a response, if any.
#[must_use]
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("catalog_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
