//! Product route handlers: detail page, likes and comments.
//!
//! Like and comment submissions answer with a 303 redirect back to the
//! product page, or with JSON when the request came from script (see
//! [`wants_json`]).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use catalog_core::ProductId;

use super::page::{ActiveTab, CommentView, PageContext, ProductView, wants_json};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::{Flash, OptionalAuth, push_flash};
use crate::models::{FlashLevel, Requester};
use crate::services::catalog::{
    self, CatalogError, CommentRequest, DUPLICATE_LIKE_MESSAGE, LikeOutcome, LikeRequest,
    MAX_COMMENT_LENGTH, ProductRequest,
};
use crate::state::AppState;

// =============================================================================
// Templates
// =============================================================================

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub category_name: String,
    pub category_url: String,
    pub product: ProductView,
    pub like_count: i64,
    pub liked: bool,
    pub comments: Vec<CommentView>,
    pub max_comment_length: usize,
}

/// Comment list fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/comments.html")]
pub struct CommentsFragmentTemplate {
    pub comments: Vec<CommentView>,
}

// =============================================================================
// JSON Payloads
// =============================================================================

/// JSON body returned by the like endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct LikeResponse {
    pub product_id: i64,
    /// Whether this request stored a new like.
    pub created: bool,
    pub like_count: i64,
    pub message: Option<String>,
}

/// JSON body returned by the comment endpoints.
#[derive(Debug, Serialize)]
pub struct CommentsResponse {
    pub product_id: i64,
    pub comments: Vec<CommentView>,
}

/// JSON body for a rejected submission.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Comment form data.
#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub body: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display a product detail page.
#[instrument(skip(state, requester, auth, flash))]
pub async fn show(
    State(state): State<AppState>,
    Path((category_slug, product_slug)): Path<(String, String)>,
    requester: Requester,
    auth: OptionalAuth,
    flash: Flash,
) -> Result<ProductShowTemplate> {
    let page = catalog::product_page(
        state.catalog(),
        ProductRequest {
            category_slug,
            product_slug,
            requester,
        },
    )
    .await?;

    Ok(ProductShowTemplate {
        page: PageContext::new(ActiveTab::ProductDetail, flash, auth),
        category_url: page.category.url(),
        category_name: page.category.name,
        product: ProductView::from(&page.product),
        like_count: page.like_count,
        liked: page.liked_by_requester,
        comments: page.comments.iter().map(CommentView::from).collect(),
        max_comment_length: MAX_COMMENT_LENGTH,
    })
}

/// Like a product.
///
/// A repeated like is not an error: the requester is warned and the request
/// completes normally.
#[instrument(skip(state, session, headers))]
pub async fn like(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    requester: Requester,
    session: Session,
    headers: HeaderMap,
) -> Result<Response> {
    let result = catalog::like_product(
        state.catalog(),
        LikeRequest {
            product_id,
            requester,
        },
    )
    .await?;

    let product_id_str = product_id.to_string();
    add_breadcrumb(
        "catalog",
        "Liked product",
        Some(&[("product_id", product_id_str.as_str())]),
    );

    let duplicate = result.outcome == LikeOutcome::AlreadyLiked;

    if wants_json(&headers) {
        return Ok(Json(LikeResponse {
            product_id: result.product.id.as_i64(),
            created: !duplicate,
            like_count: result.like_count,
            message: duplicate.then(|| DUPLICATE_LIKE_MESSAGE.to_string()),
        })
        .into_response());
    }

    if duplicate {
        push_flash(&session, FlashLevel::Warning, DUPLICATE_LIKE_MESSAGE).await?;
    }
    Ok(Redirect::to(&result.product.url()).into_response())
}

/// List a product's comments, newest first.
#[instrument(skip(state, headers))]
pub async fn comments(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    headers: HeaderMap,
) -> Result<Response> {
    let listed = catalog::list_comments(state.catalog(), product_id).await?;
    let comments: Vec<CommentView> = listed.comments.iter().map(CommentView::from).collect();

    if wants_json(&headers) {
        return Ok(Json(CommentsResponse {
            product_id: listed.product.id.as_i64(),
            comments,
        })
        .into_response());
    }

    Ok(CommentsFragmentTemplate { comments }.into_response())
}

/// Add a comment to a product.
#[instrument(skip(state, session, headers, form))]
pub async fn add_comment(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<CommentForm>,
) -> Result<Response> {
    let json = wants_json(&headers);
    let result = catalog::add_comment(
        state.catalog(),
        CommentRequest {
            product_id,
            body: form.body,
        },
    )
    .await;

    match result {
        Ok((product, comment)) if json => Ok((
            StatusCode::CREATED,
            Json(CommentsResponse {
                product_id: product.id.as_i64(),
                comments: vec![CommentView::from(&comment)],
            }),
        )
            .into_response()),
        Ok((product, _)) => {
            push_flash(&session, FlashLevel::Success, "Thanks for your comment").await?;
            Ok(Redirect::to(&product.url()).into_response())
        }
        Err(CatalogError::InvalidInput(message)) if json => Ok((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: message }),
        )
            .into_response()),
        Err(CatalogError::InvalidInput(message)) => {
            let product = catalog::find_product(state.catalog(), product_id).await?;
            push_flash(&session, FlashLevel::Error, message).await?;
            Ok(Redirect::to(&product.url()).into_response())
        }
        Err(e) => Err(e.into()),
    }
}
