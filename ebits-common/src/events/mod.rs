//! Event types for the EBITS event system
//!
//! Provides the shared event vocabulary and the EventBus used to report
//! playback progress to observers (status displays, JSON event streams, tests).

mod playback_types;

pub use playback_types::{PlaybackStatus, StateSnapshot};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// EBITS event types
///
/// Every event carries the id of the execution run that produced it, so one bus
/// can serve several consecutive runs. Events serialize with a `type` tag for
/// line-oriented JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EbitsEvent {
    /// A validated script started executing against an audio source
    RunStarted {
        run_id: Uuid,
        /// Number of validated instructions
        instruction_count: usize,
        /// Number of input WAV files
        file_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// A PCM chunk was pulled from the audio source and replay begins
    ChunkStarted {
        run_id: Uuid,
        chunk_index: usize,
        /// Index of the input file the chunk belongs to
        file_index: usize,
        /// PCM bytes in the chunk
        bytes: usize,
        timestamp: DateTime<Utc>,
    },

    /// One instruction was dispatched
    InstructionExecuted {
        run_id: Uuid,
        chunk_index: usize,
        /// Source line of the instruction (1-based)
        line: usize,
        mnemonic: String,
        /// State after the instruction took effect
        snapshot: StateSnapshot,
        timestamp: DateTime<Utc>,
    },

    /// Status tag changed
    StatusChanged {
        run_id: Uuid,
        old_status: PlaybackStatus,
        new_status: PlaybackStatus,
        timestamp: DateTime<Utc>,
    },

    /// A WAV buffer was handed to the playback sink and the sink succeeded
    BufferDispatched {
        run_id: Uuid,
        chunk_index: usize,
        /// Total WAV bytes including header
        bytes: usize,
        /// Sample rate declared in the WAV header
        sample_rate: u32,
        timestamp: DateTime<Utc>,
    },

    /// The playback sink failed; the rest of the chunk is skipped
    SinkFailed {
        run_id: Uuid,
        chunk_index: usize,
        line: usize,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// The run ended (HALT, or audio exhausted)
    RunFinished {
        run_id: Uuid,
        status: PlaybackStatus,
        chunks_processed: usize,
        dispatches: usize,
        halted: bool,
        timestamp: DateTime<Utc>,
    },
}

impl EbitsEvent {
    /// Run id carried by the event
    pub fn run_id(&self) -> Uuid {
        match self {
            EbitsEvent::RunStarted { run_id, .. }
            | EbitsEvent::ChunkStarted { run_id, .. }
            | EbitsEvent::InstructionExecuted { run_id, .. }
            | EbitsEvent::StatusChanged { run_id, .. }
            | EbitsEvent::BufferDispatched { run_id, .. }
            | EbitsEvent::SinkFailed { run_id, .. }
            | EbitsEvent::RunFinished { run_id, .. } => *run_id,
        }
    }

    /// Short name of the event variant, as used in the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            EbitsEvent::RunStarted { .. } => "RunStarted",
            EbitsEvent::ChunkStarted { .. } => "ChunkStarted",
            EbitsEvent::InstructionExecuted { .. } => "InstructionExecuted",
            EbitsEvent::StatusChanged { .. } => "StatusChanged",
            EbitsEvent::BufferDispatched { .. } => "BufferDispatched",
            EbitsEvent::SinkFailed { .. } => "SinkFailed",
            EbitsEvent::RunFinished { .. } => "RunFinished",
        }
    }
}

/// Broadcast bus for run events
///
/// Publishing never waits on subscribers. A subscriber that falls more than
/// `capacity` events behind sees `RecvError::Lagged` and skips ahead.
///
/// # Examples
///
/// ```
/// use ebits_common::events::{EbitsEvent, EventBus, PlaybackStatus};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit(EbitsEvent::StatusChanged {
///     run_id: uuid::Uuid::new_v4(),
///     old_status: PlaybackStatus::Halted,
///     new_status: PlaybackStatus::Playing,
///     timestamp: chrono::Utc::now(),
/// }).ok();
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EbitsEvent>,
    capacity: usize,
}

impl EventBus {
    /// Bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// New receiver for events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<EbitsEvent> {
        self.tx.subscribe()
    }

    /// Send to every subscriber, returning how many received it.
    /// Fails when nobody is subscribed.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: EbitsEvent,
    ) -> Result<usize, broadcast::error::SendError<EbitsEvent>> {
        self.tx.send(event)
    }

    /// Emit without caring whether anyone listens
    pub fn emit_lossy(&self, event: EbitsEvent) {
        let _ = self.tx.send(event);
    }

    /// Live receivers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Per-subscriber buffer size
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("capacity", &self.capacity)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_event(run_id: Uuid) -> EbitsEvent {
        EbitsEvent::StatusChanged {
            run_id,
            old_status: PlaybackStatus::Halted,
            new_status: PlaybackStatus::Playing,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_eventbus_new() {
        let bus = EventBus::new(100);
        assert_eq!(bus.capacity(), 100);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_eventbus_emit_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(status_event(Uuid::new_v4())).is_err());
        // Lossy variant must not panic
        bus.emit_lossy(status_event(Uuid::new_v4()));
    }

    #[tokio::test]
    async fn test_eventbus_emit_with_subscriber() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        let run_id = Uuid::new_v4();

        assert_eq!(bus.emit(status_event(run_id)).unwrap(), 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.run_id(), run_id);
        match received {
            EbitsEvent::StatusChanged {
                old_status,
                new_status,
                ..
            } => {
                assert_eq!(old_status, PlaybackStatus::Halted);
                assert_eq!(new_status, PlaybackStatus::Playing);
            }
            other => panic!("Wrong event type received: {:?}", other),
        }
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = EbitsEvent::RunFinished {
            run_id: Uuid::nil(),
            status: PlaybackStatus::Halted,
            chunks_processed: 3,
            dispatches: 2,
            halted: true,
            timestamp: Utc::now(),
        };

        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.event_type());
        assert_eq!(json["status"], "halted");
        assert_eq!(json["chunks_processed"], 3);

        let back: EbitsEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back.event_type(), "RunFinished");
    }
}
