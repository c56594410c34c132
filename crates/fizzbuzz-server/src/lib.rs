//! # `fizzbuzz-server`
//!
//! HTTP front-end for the [`fizzbuzz`] renderer.
//!
//! ## Endpoints
//!
//! - `GET /render?limit=&int1=&int2=&str1=&str2=` - renders the sequence and
//!   returns it comma-joined.
//! - `GET /statistics` - returns the most requested parameter set and how many
//!   times it was requested.
//!
//! Every body uses the same envelope:
//!
//! ```json
//! { "error": false, "response": "1,2,fizz,4,buzz" }
//! ```

pub mod server;
