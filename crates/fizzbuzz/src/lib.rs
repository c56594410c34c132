//! # fizzbuzz
//!
//! Renders parameterized FizzBuzz sequences and keeps track of which parameter
//! sets are requested most often.
//!
//! - [`Request`] - an immutable parameter set (`limit`, `int1`, `int2`,
//!   `str1`, `str2`), validated before rendering.
//! - [`Statistics`] - a concurrency-safe frequency counter keyed by
//!   [`Request`], tracking the most recorded key.
//! - [`Renderer`] - validates a [`Request`], streams its items from a
//!   background task and records the request in the shared statistics.
//!
//! ## Example
//!
//! ```no_run
//! use fizzbuzz::{Renderer, Request};
//! use futures::StreamExt;
//!
//! # #[tokio::main]
//! # async fn main() -> fizzbuzz::Result<()> {
//! let renderer: Renderer = Renderer::default();
//! let request = Request::new(15, 3, 5, "fizz", "buzz");
//!
//! let items: Vec<String> = renderer.render(request).into_result()?.collect().await;
//! assert_eq!(items.last().map(String::as_str), Some("fizzbuzz"));
//! # Ok(())
//! # }
//! ```

mod error;
mod renderer;
mod request;
mod statistics;

pub use crate::error::*;
pub use crate::renderer::*;
pub use crate::request::*;
pub use crate::statistics::*;
