//! Observer interface for run progress
//!
//! The executor reports every transition through a [`PlaybackObserver`]
//! instead of writing to shared global state.

use ebits_common::events::{EbitsEvent, EventBus};

/// Receives executor events in order. Must not block.
pub trait PlaybackObserver: Send + Sync {
    fn on_event(&self, event: &EbitsEvent);
}

impl PlaybackObserver for EventBus {
    fn on_event(&self, event: &EbitsEvent) {
        self.emit_lossy(event.clone());
    }
}

/// Drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PlaybackObserver for NoopObserver {
    fn on_event(&self, _event: &EbitsEvent) {}
}
