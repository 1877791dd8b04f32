// ── Change notifier ──
//
// Last-value broadcast telling observers which slot changed. Built on a
// `watch` channel: late subscribers see only the most recent broadcast,
// and sending never blocks the reconciler.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// What changed in the roster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RosterChange {
    /// Nothing yet -- the initial channel value, ignored by observers.
    #[default]
    None,
    /// The whole roster changed; re-derive the view from scratch.
    All,
    /// Only the slot bound to this device changed.
    Device(u32),
}

/// Broadcast side of the roster change channel.
#[derive(Debug)]
pub struct ChangeNotifier {
    tx: watch::Sender<RosterChange>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(RosterChange::None);
        Self { tx }
    }

    /// Attach an observer. Delivery to each receiver is independent.
    pub fn subscribe(&self) -> watch::Receiver<RosterChange> {
        self.tx.subscribe()
    }

    pub fn notify_all(&self) {
        // `send_modify` marks the channel changed even with zero receivers
        // and even when the value repeats.
        self.tx.send_modify(|v| *v = RosterChange::All);
    }

    pub fn notify_device(&self, device_id: u32) {
        self.tx.send_modify(|v| *v = RosterChange::Device(device_id));
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}
