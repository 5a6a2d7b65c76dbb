//! Database migration command.
//!
//! Applies `crates/storefront/migrations/`, which creates the `catalog`
//! schema and the `tower_sessions` session table.

use super::{CommandError, connect};

/// Run all pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running catalog migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Catalog migrations complete!");
    Ok(())
}
