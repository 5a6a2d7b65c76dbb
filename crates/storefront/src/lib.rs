//! Catalog storefront library.
//!
//! Category and product pages, likes, comments and the cart placeholder,
//! served with axum. The binary in `main.rs` wires this to `PostgreSQL`;
//! tests wire it to the in-memory stores.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
