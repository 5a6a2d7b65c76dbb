//! User domain types.

use chrono::{DateTime, Utc};

use catalog_core::{UserId, Username};

/// A storefront user.
///
/// Users only exist to give likes an authenticated identity; they are
/// created from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name.
    pub username: Username,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}
