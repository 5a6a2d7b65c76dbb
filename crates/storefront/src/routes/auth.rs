//! Authentication route handlers.
//!
//! Username/password login against accounts created with the CLI. Logging
//! in only changes whose likes a request counts as.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::HeaderValue,
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::page::{ActiveTab, PageContext};
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{Flash, OptionalAuth, clear_current_user, push_flash, set_current_user};
use crate::models::{CurrentUser, FlashLevel};
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Where to go after login when no `next` is given.
const DEFAULT_REDIRECT: &str = "/categories";

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

/// Query parameters for the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub next: String,
}

/// Display the login page.
pub async fn login_page(
    Query(query): Query<LoginQuery>,
    auth: OptionalAuth,
    flash: Flash,
) -> LoginTemplate {
    LoginTemplate {
        page: PageContext::new(ActiveTab::Login, flash, auth),
        next: safe_next(query.next.as_deref()).to_string(),
    }
}

/// Handle login form submission.
#[instrument(skip_all, fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect> {
    let next = safe_next(form.next.as_deref()).to_string();

    match AuthService::new(state.users())
        .login(&form.username, &form.password)
        .await
    {
        Ok(user) => {
            let current = CurrentUser {
                id: user.id,
                username: user.username,
            };
            set_current_user(&session, &current).await?;
            set_sentry_user(&current.id, current.username.as_str());
            push_flash(
                &session,
                FlashLevel::Success,
                format!("Welcome back, {}", current.username),
            )
            .await?;
            Ok(Redirect::to(&next))
        }
        Err(AuthError::InvalidCredentials | AuthError::InvalidUsername(_)) => {
            tracing::warn!("Login failed");
            push_flash(&session, FlashLevel::Error, "Invalid username or password").await?;
            Ok(Redirect::to(&login_url(&next)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Handle logout.
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    push_flash(&session, FlashLevel::Info, "You have been logged out").await?;
    Ok(Redirect::to(DEFAULT_REDIRECT))
}

/// Restrict post-login redirects to local paths.
///
/// Browsers treat `/\host` like `//host`, so a backslash in second position
/// is rejected too. Anything that cannot be a `Location` header value falls
/// back to the default.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if is_local_path(path) => path,
        _ => DEFAULT_REDIRECT,
    }
}

fn is_local_path(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.first() == Some(&b'/')
        && !matches!(bytes.get(1), Some(b'/' | b'\\'))
        && !bytes.iter().any(u8::is_ascii_control)
        && HeaderValue::from_str(path).is_ok()
}

fn login_url(next: &str) -> String {
    if next == DEFAULT_REDIRECT {
        "/auth/login".to_string()
    } else {
        format!("/auth/login?next={}", urlencoding::encode(next))
    }
}
