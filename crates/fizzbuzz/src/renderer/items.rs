use core::pin::Pin;
use core::task::{Context, Poll};
use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::DropGuard;

/// The rendered items of a request, delivered in order.
///
/// Items are produced by a background task and pulled through a bounded
/// channel. Dropping this stream before it is exhausted cancels the producer.
#[derive(Debug)]
pub struct Items {
    inner: ReceiverStream<String>,
    // Cancels the producer when the consumer goes away.
    guard: Option<DropGuard>,
}

impl Items {
    pub(crate) fn new(rx: mpsc::Receiver<String>, guard: DropGuard) -> Self {
        Self {
            inner: ReceiverStream::new(rx),
            guard: Some(guard),
        }
    }

    /// A sequence that is already closed and yields nothing.
    pub(crate) fn closed() -> Self {
        let (_, rx) = mpsc::channel(1);
        Self {
            inner: ReceiverStream::new(rx),
            guard: None,
        }
    }

    /// Stops the producer without dropping the stream.
    ///
    /// Items already buffered can still be received; no new ones are sent.
    pub fn close(&mut self) {
        self.inner.close();
        if let Some(guard) = self.guard.take() {
            guard.disarm().cancel();
        }
    }
}

impl Stream for Items {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
