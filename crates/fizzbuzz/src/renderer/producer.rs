use crate::Request;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Produces every item of `request` into `items_tx`, one at a time.
///
/// The request must already be validated. Items are sent in increasing order
/// and each send waits for channel capacity, so the consumer drives how far
/// production gets ahead of it.
///
/// # Behavior
///
/// - Returns as soon as `cancel` is triggered, checked before every send.
/// - Returns when the consumer drops its receiver.
/// - Otherwise returns after `limit` items.
#[allow(clippy::used_underscore_binding)]
pub(crate) async fn produce_items(
    request: Request,
    items_tx: mpsc::Sender<String>,
    cancel: CancellationToken,
) {
    #[cfg(feature = "tracing")]
    tracing::debug!("Request rendering started {request:?}");

    for i in 1..=request.limit() {
        let item = request.item(i);

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Request rendering cancelled at item {i} {request:?}");
                return;
            }
            sent = items_tx.send(item) => {
                if let Err(_e) = sent {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Request rendering stopped, consumer gone at item {i}: {_e}");
                    return;
                }
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::debug!("Request rendering done {request:?}");
}
