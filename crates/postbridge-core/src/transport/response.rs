//! Single-assignment response slot.
//!
//! `ResponseSlot` is the write side, held by the exchange; `ResponseFuture`
//! is the read side, handed to the caller. The slot wraps a oneshot sender,
//! so a second settlement is impossible once the first has been sent.

use crate::channel::ChannelId;
use crate::protocol::Envelope;
use crate::{Result, TransportError};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::debug;

/// Create a connected slot/future pair for `channel`.
pub(crate) fn response_pair(channel: ChannelId) -> (ResponseSlot, ResponseFuture) {
    let (tx, rx) = oneshot::channel();
    (
        ResponseSlot {
            tx: Some(tx),
            channel,
        },
        ResponseFuture { rx, channel },
    )
}

/// Write side of a response. Settles at most once.
#[derive(Debug)]
pub(crate) struct ResponseSlot {
    tx: Option<oneshot::Sender<Result<Envelope>>>,
    channel: ChannelId,
}

impl ResponseSlot {
    /// Settle with `outcome`. Returns `false` if the slot was already settled.
    pub(crate) fn settle(&mut self, outcome: Result<Envelope>) -> bool {
        let Some(tx) = self.tx.take() else {
            return false;
        };

        let fulfilled = outcome.is_ok();
        if tx.send(outcome).is_err() {
            debug!(
                "Channel {} settled after the caller dropped its future",
                self.channel
            );
        } else {
            debug!("Channel {} settled (fulfilled: {})", self.channel, fulfilled);
        }
        true
    }
}

/// Future resolving to the terminal envelope of a request.
///
/// Fulfils with the success envelope, or fails with `Remote` (carrying the
/// error envelope verbatim), `MalformedResponse`, `Timeout` or a host error.
/// If the exchange is abandoned and its slot released without settling, the
/// future resolves to `Abandoned`.
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct ResponseFuture {
    rx: oneshot::Receiver<Result<Envelope>>,
    channel: ChannelId,
}

impl ResponseFuture {
    /// Correlation token of the channel carrying this request.
    pub fn channel_id(&self) -> ChannelId {
        self.channel
    }
}

impl Future for ResponseFuture {
    type Output = Result<Envelope>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(TransportError::Abandoned)),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    #[tokio::test]
    async fn test_settle_once() {
        let (mut slot, future) = response_pair(ChannelId::new());

        let envelope = Envelope::parse(r#"{"pong":true}"#).unwrap();
        assert!(slot.settle(Ok(envelope.clone())));

        // Second settlement is refused and does not replace the first
        assert!(!slot.settle(Err(TransportError::ChannelClosed)));

        assert_eq!(future.await.unwrap(), envelope);
    }

    #[tokio::test]
    async fn test_dropped_slot_resolves_abandoned() {
        let (slot, future) = response_pair(ChannelId::new());
        drop(slot);

        assert!(matches!(future.await, Err(TransportError::Abandoned)));
    }

    #[test]
    fn test_unsettled_future_is_pending() {
        let (mut slot, mut future) = response_pair(ChannelId::new());

        assert!((&mut future).now_or_never().is_none());

        // Still open for its first settlement
        assert!(slot.settle(Err(TransportError::ChannelClosed)));
        assert!(matches!(
            future.now_or_never(),
            Some(Err(TransportError::ChannelClosed))
        ));
    }

    #[test]
    fn test_settle_after_caller_dropped_future() {
        let (mut slot, future) = response_pair(ChannelId::new());
        drop(future);

        assert!(slot.settle(Err(TransportError::ChannelClosed)));
        assert!(!slot.settle(Err(TransportError::ChannelClosed)));
    }
}
