//! One-shot flash messages stored in the session.
//!
//! A handler pushes a message before redirecting; the next rendered page
//! takes (and thereby clears) all pending messages.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::models::{FlashLevel, FlashMessage, session_keys};

/// Queue a message for the next rendered page.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn push_flash(
    session: &Session,
    level: FlashLevel,
    text: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    let mut messages: Vec<FlashMessage> = session
        .get(session_keys::FLASH_MESSAGES)
        .await?
        .unwrap_or_default();
    messages.push(FlashMessage::new(level, text));
    session
        .insert(session_keys::FLASH_MESSAGES, messages)
        .await
}

/// Remove and return all pending messages.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn take_flash(
    session: &Session,
) -> Result<Vec<FlashMessage>, tower_sessions::session::Error> {
    Ok(session
        .remove::<Vec<FlashMessage>>(session_keys::FLASH_MESSAGES)
        .await?
        .unwrap_or_default())
}

/// Extractor yielding the pending flash messages, clearing them.
///
/// Without a session layer, or if the session cannot be read, there are no
/// messages.
pub struct Flash(pub Vec<FlashMessage>);

impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let messages = match parts.extensions.get::<Session>() {
            Some(session) => take_flash(session).await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to read flash messages");
                Vec::new()
            }),
            None => Vec::new(),
        };

        Ok(Self(messages))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_flash_messages_are_taken_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        push_flash(&session, FlashLevel::Warning, "first").await.unwrap();
        push_flash(&session, FlashLevel::Success, "second").await.unwrap();

        let messages = take_flash(&session).await.unwrap();
        assert_eq!(
            messages,
            vec![
                FlashMessage::new(FlashLevel::Warning, "first"),
                FlashMessage::new(FlashLevel::Success, "second"),
            ]
        );
        assert!(take_flash(&session).await.unwrap().is_empty());
    }
}
