//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request span with an empty `request_id` field)
//! 3. Request ID (fills the span field, echoes the header)
//! 4. Session layer (tower-sessions)
//! 5. Security headers
//!
//! Extractors for handlers live here too: [`OptionalAuth`], [`Flash`] and
//! the [`Requester`](crate::models::Requester) identity.

pub mod auth;
pub mod flash;
pub mod request_id;
pub mod requester;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAuth, clear_current_user, set_current_user};
pub use flash::{Flash, push_flash, take_flash};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
