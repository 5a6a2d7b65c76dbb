//! The identity a request acts on behalf of.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use catalog_core::UserId;

/// Who is performing a request.
///
/// Likes are scoped to exactly one of these: a logged-in user, or the
/// address an anonymous visitor connects from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Requester {
    /// An authenticated storefront user.
    User(UserId),
    /// An anonymous visitor identified by client IP.
    Anonymous(IpAddr),
}

impl Requester {
    /// The user ID, if the requester is authenticated.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Anonymous(_) => None,
        }
    }

    /// The client IP, if the requester is anonymous.
    #[must_use]
    pub const fn ip(&self) -> Option<IpAddr> {
        match self {
            Self::User(_) => None,
            Self::Anonymous(ip) => Some(*ip),
        }
    }
}
