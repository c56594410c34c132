//! Request rendering.
//!
//! [`Renderer::render`] validates a [`Request`] and, when it is valid, spawns
//! a background task that produces the items into a bounded channel. The
//! caller gets a [`Response`] back immediately and pulls items from its
//! [`Items`] stream. Every render call is recorded in the shared
//! [`StatisticRecorder`] exactly once, no matter how many items end up being
//! consumed.
//!
//! ## Cancellation
//!
//! - Dropping (or [closing](Items::close)) the [`Items`] stream cancels its
//!   producer.
//! - [`Renderer::shutdown`] cancels every in-flight producer at once. Renders
//!   issued afterwards return an empty, already-closed sequence.

mod items;
mod producer;

pub use items::Items;

use crate::{Error, Request, Result, StatisticRecorder, Statistics};
use producer::produce_items;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Whether requests that fail validation are recorded in the statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecordPolicy {
    /// Record every render call, valid or not.
    #[default]
    AllAttempts,
    /// Record only requests that pass validation.
    ValidOnly,
}

/// Tuning knobs for a [`Renderer`].
#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Capacity of the channel between producer and consumer.
    ///
    /// With a capacity of 1 the producer is at most one item ahead of the
    /// consumer. Larger values trade memory for fewer task wake-ups. Values
    /// of 0 are treated as 1.
    pub item_buffer_size: usize,
    pub record_policy: RecordPolicy,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            item_buffer_size: 1,
            record_policy: RecordPolicy::default(),
        }
    }
}

/// The outcome of a single [`Renderer::render`] call.
///
/// Either carries a validation error and an empty sequence, or no error and
/// the stream of rendered items.
#[derive(Debug)]
pub struct Response {
    error: Option<Error>,
    items: Items,
}

impl Response {
    fn rejected(error: Error) -> Self {
        Self {
            error: Some(error),
            items: Items::closed(),
        }
    }

    /// The validation error, if the request was rejected.
    pub const fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Mutable access to the item stream.
    pub const fn items(&mut self) -> &mut Items {
        &mut self.items
    }

    /// Splits the response into its error and item stream.
    pub fn into_parts(self) -> (Option<Error>, Items) {
        (self.error, self.items)
    }

    /// Returns the item stream, or the validation error.
    ///
    /// # Errors
    ///
    /// Returns the validation error when the request was rejected.
    pub fn into_result(self) -> Result<Items> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.items),
        }
    }
}

/// Renders requests and records them into a shared [`StatisticRecorder`].
///
/// Cloning a renderer is cheap; clones share the recorder and the shutdown
/// signal.
#[derive(Debug)]
pub struct Renderer<S = Statistics> {
    statistics: Arc<S>,
    config: RendererConfig,
    shutdown: CancellationToken,
}

impl<S> Clone for Renderer<S> {
    fn clone(&self) -> Self {
        Self {
            statistics: Arc::clone(&self.statistics),
            config: self.config.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}

impl Default for Renderer<Statistics> {
    fn default() -> Self {
        Self::new(Arc::new(Statistics::new()), RendererConfig::default())
    }
}

impl<S> Renderer<S>
where
    S: StatisticRecorder,
{
    /// Creates a renderer that records into `statistics`.
    pub fn new(statistics: Arc<S>, config: RendererConfig) -> Self {
        Self {
            statistics,
            config,
            shutdown: CancellationToken::new(),
        }
    }

    /// The recorder shared by every render of this renderer.
    pub const fn statistics(&self) -> &Arc<S> {
        &self.statistics
    }

    pub const fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Validates `request` and starts producing its items.
    ///
    /// Returns immediately. For an invalid request the [`Response`] carries
    /// the validation error and an empty sequence, and no background work is
    /// started. For a valid request a producer task is spawned on the current
    /// Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self)))]
    pub fn render(&self, request: Request) -> Response {
        if let Err(error) = request.validate() {
            if self.config.record_policy == RecordPolicy::AllAttempts {
                self.statistics.record(&request);
            }
            #[cfg(feature = "tracing")]
            tracing::debug!("Request rejected: {error}");
            return Response::rejected(error);
        }

        self.statistics.record(&request);

        if self.shutdown.is_cancelled() {
            #[cfg(feature = "tracing")]
            tracing::debug!("Renderer is shut down, returning a closed sequence");
            return Response {
                error: None,
                items: Items::closed(),
            };
        }

        let cancel = self.shutdown.child_token();
        let (items_tx, items_rx) = mpsc::channel(self.config.item_buffer_size.max(1));
        let items = Items::new(items_rx, cancel.clone().drop_guard());

        let fut = produce_items(request, items_tx, cancel);
        #[cfg(feature = "tracing")]
        let fut = {
            use tracing::Instrument;
            fut.instrument(tracing::debug_span!("producing"))
        };
        tokio::spawn(fut);

        Response { error: None, items }
    }

    /// Cancels every in-flight producer and refuses to start new ones.
    pub fn shutdown(&self) {
        #[cfg(feature = "tracing")]
        tracing::debug!("Cancelling in-flight renders");
        self.shutdown.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}
