//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `catalog` - Category listing, product resolution, likes, comments and
//!   the cart placeholder
//! - `auth` - Username/password authentication
//!
//! Service functions take an explicit store handle plus a plain request
//! value and return domain results, so they can be tested without a server.

pub mod auth;
pub mod catalog;
