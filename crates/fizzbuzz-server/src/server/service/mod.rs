//! HTTP service implementation.
//!
//! ## Structure
//!
//! - [`handler`] - axum handlers and the shared [`AppState`].
//! - [`params`] - query-string parsing into a [`fizzbuzz::Request`].
//! - [`response`] - the JSON envelope and [`ApiError`].

pub mod handler;
pub mod params;
pub mod response;

pub use handler::AppState;
pub use response::{ApiError, ApiResponse};
