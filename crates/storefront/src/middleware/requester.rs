//! Requester identity extraction.
//!
//! A logged-in session user wins. Otherwise the visitor is identified by the
//! client IP: the socket peer address, or the first `X-Forwarded-For` entry
//! when the deployment sits behind a trusted proxy.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, StatusCode, request::Parts},
};
use tower_sessions::Session;

use super::auth::current_user;
use crate::models::Requester;
use crate::state::AppState;

/// Header set by reverse proxies with the original client address.
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

impl FromRequestParts<AppState> for Requester {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>()
            && let Some(user) = current_user(session).await
        {
            return Ok(Self::User(user.id));
        }

        if state.config().trust_forwarded_for
            && let Some(ip) = forwarded_for(&parts.headers)
        {
            return Ok(Self::Anonymous(ip));
        }

        let ConnectInfo(addr) = ConnectInfo::<SocketAddr>::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                tracing::error!("Connection info missing; serve with connect info enabled");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Unable to determine client address",
                )
            })?;

        Ok(Self::Anonymous(addr.ip()))
    }
}

/// First valid address in `X-Forwarded-For`.
fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get(FORWARDED_FOR_HEADER)?
        .to_str()
        .ok()?
        .split(',')
        .next()
        .and_then(|first| first.trim().parse().ok())
}
