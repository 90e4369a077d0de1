//! HTTP API layer for chainfeed.
//!
//! This crate provides the JSON API served under `/api`:
//!
//! - **Endpoints**: users, posts, interactions, notifications, messages,
//!   files, uploads and the chat proxy
//! - **Extractors**: JSON bodies and query strings with 400 rejections
//! - **State**: services wired from a database handle and configuration
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
