//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                   - Redirect to /categories
//! GET  /health                             - Liveness check
//! GET  /health/ready                       - Store readiness check
//!
//! # Catalog
//! GET  /categories                         - Category list with product counts
//! GET  /categories/{category}              - Category products (price_from, price_to, following)
//! GET  /categories/{category}/{product}    - Product detail
//!
//! # Interactions (redirect, or JSON for script requests)
//! POST /products/{id}/like                 - Like a product
//! GET  /products/{id}/comments             - Comment list fragment
//! POST /products/{id}/comments             - Add a comment
//!
//! # Cart
//! GET  /cart                               - Cart page (always empty)
//! POST /cart/add                           - 501 Not Implemented
//!
//! # Auth
//! GET  /auth/login                         - Login page
//! POST /auth/login                         - Login action
//! POST /auth/logout                        - Logout action
//! ```

pub mod auth;
pub mod cart;
pub mod categories;
pub mod health;
pub mod page;
pub mod products;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index))
        .route("/{category_slug}", get(categories::show))
        .route("/{category_slug}/{product_slug}", get(products::show))
}

/// Create the product interaction routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/{product_id}/like", post(products::like))
        .route(
            "/{product_id}/comments",
            get(products::comments).post(products::add_comment),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/categories") }))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/categories", category_routes())
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/auth", auth_routes())
}
