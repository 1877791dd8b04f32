// ── Reactive roster snapshots ──
//
// Subscription type for consuming roster snapshots from the monitor.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::Slot;

/// A subscription to roster snapshots.
///
/// Provides both point-in-time access and reactive change notification via
/// [`changed`](Self::changed) or by converting into a `Stream`.
pub struct SlotStream {
    current: Arc<Vec<Slot>>,
    receiver: watch::Receiver<Arc<Vec<Slot>>>,
}

impl SlotStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<Vec<Slot>>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation time.
    pub fn current(&self) -> &Arc<Vec<Slot>> {
        &self.current
    }

    /// The latest snapshot (may have moved on since creation).
    pub fn latest(&self) -> Arc<Vec<Slot>> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next roster mutation, returning the new snapshot.
    /// Returns `None` once the monitor has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<Vec<Slot>>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> SlotWatchStream {
        SlotWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding a fresh snapshot per roster mutation.
pub struct SlotWatchStream {
    inner: WatchStream<Arc<Vec<Slot>>>,
}

impl Stream for SlotWatchStream {
    type Item = Arc<Vec<Slot>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // WatchStream<Arc<_>> is Unpin, so projecting through Pin is fine.
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
