//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from database row types.

pub mod catalog;
pub mod requester;
pub mod session;
pub mod user;

pub use catalog::{
    Category, CategorySummary, Comment, Like, NewCategory, NewProduct, Product, ProductFilter,
};
pub use requester::Requester;
pub use session::{CurrentUser, FlashLevel, FlashMessage, keys as session_keys};
pub use user::User;
