#![forbid(unsafe_code)]

use cl_core::model::Entry;
use std::sync::mpsc::Sender;

/// Receives the freshly materialized full order after every committed
/// mutation. Delivery is best-effort; a failed publish never affects the
/// mutation that produced it.
pub trait NotificationSink: Send {
    fn publish(&self, entries: &[Entry]);
}

/// Discards every notification. Useful for embedders that only poll.
pub struct NullSink;

impl NotificationSink for NullSink {
    fn publish(&self, _entries: &[Entry]) {}
}

/// Forwards each published order through an mpsc channel.
pub struct ChannelSink {
    tx: Sender<Vec<Entry>>,
}

impl ChannelSink {
    pub fn new(tx: Sender<Vec<Entry>>) -> Self {
        Self { tx }
    }
}

impl NotificationSink for ChannelSink {
    fn publish(&self, entries: &[Entry]) {
        // A disconnected receiver is not an error worth surfacing.
        let _ = self.tx.send(entries.to_vec());
    }
}
