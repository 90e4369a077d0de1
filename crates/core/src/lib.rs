//! Core business logic for chainfeed.

pub mod services;

pub use services::*;
