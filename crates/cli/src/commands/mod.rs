//! CLI command implementations.

pub mod migrate;
pub mod seed;
pub mod user;

use catalog_storefront::config::{ConfigError, StorefrontConfig};
use catalog_storefront::db::{self, RepositoryError};
use catalog_storefront::services::auth::AuthError;
use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Store operation failed.
    #[error("store error: {0}")]
    Repository(#[from] RepositoryError),

    /// User creation failed.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// Seed file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Seed file is not valid YAML for a catalog.
    #[error("invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Seed file parsed but contains invalid values.
    #[error("invalid seed entry: {0}")]
    InvalidSeed(String),
}

/// Connect to the catalog database configured in the environment.
async fn connect() -> Result<PgPool, CommandError> {
    let database_url = StorefrontConfig::database_url_from_env()?;
    tracing::info!("Connecting to catalog database...");
    Ok(db::create_pool(&database_url).await?)
}
