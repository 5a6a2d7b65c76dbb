//! End-to-end router tests.
//!
//! Every request goes through the full middleware stack (sessions, request
//! IDs, security headers) against the in-memory stores.

#![allow(clippy::unwrap_used)]

use std::net::{IpAddr, Ipv4Addr};

use axum::http::StatusCode;

use catalog_integration_tests::{
    TestContext, body_json, body_string, location, session_cookie,
};
use catalog_storefront::db::CatalogStore;
use catalog_storefront::models::Requester;
use catalog_storefront::services::auth::AuthService;

const XHR: (&str, &str) = ("x-requested-with", "XMLHttpRequest");

fn client_requester() -> Requester {
    Requester::Anonymous(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7)))
}

// =============================================================================
// Catalog Pages
// =============================================================================

#[tokio::test]
async fn test_category_list_shows_counts_including_empty() {
    let ctx = TestContext::new().await;

    let response = ctx.get("/categories", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.contains(r#"href="/categories/teas""#));
    assert!(body.contains("3 products"));
    assert!(body.contains("Teapots"));
    assert!(body.contains("0 products"));
}

#[tokio::test]
async fn test_root_redirects_to_categories() {
    let ctx = TestContext::new().await;
    let response = ctx.get("/", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/categories");
}

#[tokio::test]
async fn test_unknown_category_is_404() {
    let ctx = TestContext::new().await;
    assert_eq!(
        ctx.get("/categories/coffee", None).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        ctx.get("/categories/coffee/sencha", None).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_product_under_wrong_category_is_404() {
    let ctx = TestContext::new().await;

    let response = ctx.get("/categories/teapots/sencha", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx.get(&ctx.sencha.url(), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Sencha"));
    assert!(body.contains("$8.50"));
}

#[tokio::test]
async fn test_category_price_filter() {
    let ctx = TestContext::new().await;

    let body = body_string(
        ctx.get("/categories/teas?price_from=6&price_to=8.50", None)
            .await,
    )
    .await;
    assert!(body.contains("Assam"));
    assert!(body.contains("Sencha"));
    assert!(!body.contains("Darjeeling"));

    let response = ctx.get("/categories/teas?price_from=cheap", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Blank form fields mean no filter.
    let body = body_string(ctx.get("/categories/teas?price_from=&price_to=", None).await).await;
    assert!(body.contains("Darjeeling"));
}

#[tokio::test]
async fn test_category_following_filter_uses_client_ip() {
    let ctx = TestContext::new().await;
    ctx.store
        .insert_like(ctx.assam.id, client_requester())
        .await
        .unwrap();

    let body = body_string(ctx.get("/categories/teas?following=1", None).await).await;
    assert!(body.contains("Assam"));
    assert!(!body.contains("Sencha"));
    assert!(!body.contains("Darjeeling"));
}

// =============================================================================
// Likes
// =============================================================================

#[tokio::test]
async fn test_like_twice_via_ajax() {
    let ctx = TestContext::new().await;
    let path = format!("/products/{}/like", ctx.sencha.id);

    let first = ctx.post_form(&path, "", &[XHR]).await;
    assert_eq!(first.status(), StatusCode::OK);
    let first = body_json(first).await;
    assert_eq!(first["created"], true);
    assert_eq!(first["like_count"], 1);
    assert!(first["message"].is_null());

    let second = ctx.post_form(&path, "", &[XHR]).await;
    assert_eq!(second.status(), StatusCode::OK);
    let second = body_json(second).await;
    assert_eq!(second["created"], false);
    assert_eq!(second["like_count"], 1);
    assert_eq!(second["message"], "You have already liked this product");

    assert_eq!(ctx.store.like_count(ctx.sencha.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_duplicate_like_redirects_with_warning() {
    let ctx = TestContext::new().await;
    let path = format!("/products/{}/like", ctx.sencha.id);

    let first = ctx.post_form(&path, "", &[]).await;
    assert_eq!(first.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&first), "/categories/teas/sencha");

    let second = ctx.post_form(&path, "", &[]).await;
    assert_eq!(second.status(), StatusCode::SEE_OTHER);
    let cookie = session_cookie(&second).expect("flash message needs a session");

    let page = body_string(ctx.get(location(&second), Some(&cookie)).await).await;
    assert!(page.contains("You have already liked this product"));

    // Flash messages are shown once.
    let again = body_string(ctx.get(&ctx.sencha.url(), Some(&cookie)).await).await;
    assert!(!again.contains("You have already liked this product"));
}

#[tokio::test]
async fn test_like_unknown_product_is_404() {
    let ctx = TestContext::new().await;
    let response = ctx.post_form("/products/9999/like", "", &[XHR]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx.post_form("/products/not-a-number/like", "", &[]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logged_in_like_is_separate_from_ip_like() {
    let ctx = TestContext::new().await;
    AuthService::new(ctx.store.as_ref())
        .register("jane", "correct horse battery")
        .await
        .unwrap();

    let path = format!("/products/{}/like", ctx.sencha.id);
    ctx.post_form(&path, "", &[XHR]).await;

    let login = ctx
        .post_form(
            "/auth/login",
            "username=jane&password=correct+horse+battery&next=%2Fcategories%2Fteas",
            &[],
        )
        .await;
    assert_eq!(login.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&login), "/categories/teas");
    let cookie = session_cookie(&login).unwrap();

    let response = ctx
        .post_form(&path, "", &[XHR, ("cookie", cookie.as_str())])
        .await;
    let body = body_json(response).await;
    assert_eq!(body["created"], true);
    assert_eq!(body["like_count"], 2);

    let page = body_string(ctx.get("/categories/teas", Some(&cookie)).await).await;
    assert!(page.contains("Welcome back, jane"));
    assert!(page.contains("jane"));
}

#[tokio::test]
async fn test_login_with_wrong_password_flashes_error() {
    let ctx = TestContext::new().await;
    AuthService::new(ctx.store.as_ref())
        .register("jane", "correct horse battery")
        .await
        .unwrap();

    let response = ctx
        .post_form("/auth/login", "username=jane&password=wrong-password", &[])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");

    let cookie = session_cookie(&response).unwrap();
    let page = body_string(ctx.get("/auth/login", Some(&cookie)).await).await;
    assert!(page.contains("Invalid username or password"));
}

#[tokio::test]
async fn test_login_ignores_unsafe_next() {
    let ctx = TestContext::new().await;
    AuthService::new(ctx.store.as_ref())
        .register("jane", "correct horse battery")
        .await
        .unwrap();

    for next in ["%2F%5Cevil.example", "%2F%2Fevil.example", "%2Fcategories%0Ax"] {
        let form = format!("username=jane&password=correct+horse+battery&next={next}");
        let response = ctx.post_form("/auth/login", &form, &[]).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "next={next}");
        assert_eq!(location(&response), "/categories", "next={next}");
    }
}

// =============================================================================
// Comments
// =============================================================================

#[tokio::test]
async fn test_comments_listing_and_submission() {
    let ctx = TestContext::new().await;
    let path = format!("/products/{}/comments", ctx.sencha.id);

    let response = ctx
        .post_form(&path, "body=++Grassy+and+bright.++", &[XHR])
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["comments"][0]["body"], "Grassy and bright.");

    let response = ctx.post_form(&path, "body=+++", &[XHR]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let fragment = body_string(ctx.get(&path, None).await).await;
    assert!(fragment.contains("Grassy and bright."));

    let page = body_string(ctx.get(&ctx.sencha.url(), None).await).await;
    assert!(page.contains("Grassy and bright."));
}

#[tokio::test]
async fn test_empty_comment_from_form_redirects_with_error() {
    let ctx = TestContext::new().await;
    let path = format!("/products/{}/comments", ctx.assam.id);

    let response = ctx.post_form(&path, "body=", &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/categories/teas/assam");

    let cookie = session_cookie(&response).unwrap();
    let page = body_string(ctx.get("/categories/teas/assam", Some(&cookie)).await).await;
    assert!(page.contains("Comment cannot be empty"));
}

#[tokio::test]
async fn test_comments_for_unknown_product_is_404() {
    let ctx = TestContext::new().await;
    let response = ctx.get("/products/9999/comments", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_cart_add_is_not_implemented() {
    let ctx = TestContext::new().await;
    for form in ["", "product_id=1&quantity=2", "anything=at+all"] {
        let response = ctx.post_form("/cart/add", form, &[]).await;
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }
}

#[tokio::test]
async fn test_cart_page_is_empty() {
    let ctx = TestContext::new().await;
    let response = ctx.get("/cart", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Your cart is empty"));
    assert!(body.contains(r#"<a href="/cart" class="active">"#));
}

// =============================================================================
// Operational
// =============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let ctx = TestContext::new().await;

    let response = ctx.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");

    assert_eq!(
        ctx.get("/health/ready", None).await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let ctx = TestContext::new().await;
    let response = ctx.get("/categories", None).await;

    let headers = response.headers();
    assert!(headers.contains_key("x-request-id"));
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn test_empty_category_page() {
    let ctx = TestContext::new().await;
    let response = ctx.get(&ctx.teapots.url(), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("No products match."));
    assert_eq!(ctx.teas.url(), "/categories/teas");
    assert_eq!(ctx.darjeeling.url(), "/categories/teas/darjeeling");
}
