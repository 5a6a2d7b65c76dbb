//! Cart route handlers.
//!
//! There is no cart behind these routes yet: the page always renders empty
//! and adding an item answers 501.

use askama::Template;
use askama_web::WebTemplate;
use axum::{body::Bytes, http::StatusCode};
use tracing::instrument;

use super::page::{ActiveTab, PageContext};
use crate::error::Result;
use crate::middleware::{Flash, OptionalAuth};
use crate::services::catalog;

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
}

/// Display the cart page.
pub async fn show(auth: OptionalAuth, flash: Flash) -> CartShowTemplate {
    CartShowTemplate {
        page: PageContext::new(ActiveTab::Cart, flash, auth),
    }
}

/// Add an item to the cart. Always fails with 501 Not Implemented.
#[instrument(skip_all, fields(payload_len = body.len()))]
pub async fn add(body: Bytes) -> Result<StatusCode> {
    catalog::add_to_cart(&body)?;
    Ok(StatusCode::NO_CONTENT)
}
