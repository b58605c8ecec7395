//! HTTP API layer for snapfeed.
//!
//! This crate provides the JSON API:
//!
//! - **Endpoints**: auth, posts and reactions
//! - **Extractors**: authenticated-user extraction
//! - **Middleware**: bearer-token authentication
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
