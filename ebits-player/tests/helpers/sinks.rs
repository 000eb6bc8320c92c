//! Test doubles for the playback boundary

use async_trait::async_trait;
use ebits_common::events::EbitsEvent;
use ebits_player::audio::PlaybackSink;
use ebits_player::playback::PlaybackObserver;
use ebits_player::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::time::Instant;

/// Keeps every buffer it receives, with the time it arrived
#[derive(Default)]
pub struct RecordingSink {
    buffers: Mutex<Vec<(Instant, Vec<u8>)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffers(&self) -> Vec<Vec<u8>> {
        self.buffers.lock().unwrap().iter().map(|(_, b)| b.clone()).collect()
    }

    pub fn arrivals(&self) -> Vec<Instant> {
        self.buffers.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    pub fn count(&self) -> usize {
        self.buffers.lock().unwrap().len()
    }
}

#[async_trait]
impl PlaybackSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn play(&self, wav: Vec<u8>) -> Result<()> {
        self.buffers.lock().unwrap().push((Instant::now(), wav));
        Ok(())
    }
}

/// Fails the first `failures` calls, then accepts
pub struct FailingSink {
    failures: usize,
    calls: AtomicUsize,
    accepted: AtomicUsize,
}

impl FailingSink {
    pub fn new(failures: usize) -> Self {
        Self {
            failures,
            calls: AtomicUsize::new(0),
            accepted: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlaybackSink for FailingSink {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn play(&self, _wav: Vec<u8>) -> Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(Error::Sink(format!("injected failure {}", call + 1)));
        }
        self.accepted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Collects every event the executor reports
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<EbitsEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<EbitsEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn event_types(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.event_type()).collect()
    }
}

impl PlaybackObserver for RecordingObserver {
    fn on_event(&self, event: &EbitsEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
