//! User management commands.
//!
//! Users exist so likes can follow a person across devices; there is no
//! self-service registration on the site.

use catalog_storefront::db::PgStore;
use catalog_storefront::services::auth::AuthService;

use super::{CommandError, connect};

/// Create a user with an Argon2-hashed password.
///
/// # Errors
///
/// Returns an error if the username is invalid or taken, the password is
/// too short or too long, or the database is unreachable.
pub async fn create(username: &str, password: &str) -> Result<(), CommandError> {
    let store = PgStore::new(connect().await?);

    let user = AuthService::new(&store).register(username, password).await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User created");
    Ok(())
}
