//! Playback-related type definitions
//!
//! Supporting types for playback status and state snapshots.

use serde::{Deserialize, Serialize};

/// Playback status tag
///
/// A run starts `Halted` (idle). `Halted` reached through a HALT instruction is
/// terminal for the run; `Error` only ends the current chunk.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    #[default]
    Halted,
    Playing,
    Paused,
    Error,
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackStatus::Halted => write!(f, "halted"),
            PlaybackStatus::Playing => write!(f, "playing"),
            PlaybackStatus::Paused => write!(f, "paused"),
            PlaybackStatus::Error => write!(f, "error"),
        }
    }
}

/// Read-only copy of the playback state, taken between instructions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub status: PlaybackStatus,
    /// Seek offset in seconds
    pub seek_seconds: f64,
    /// Speed multiplier, 0.5 to 2.0
    pub speed: f64,
    /// Volume multiplier, 0.0 to 2.0
    pub volume: f64,
    pub repeat_count: u32,
    pub halted: bool,
    /// Number of instructions dispatched so far in the run
    pub history_len: usize,
    /// Source line of the most recently dispatched instruction
    pub current_line: Option<usize>,
}
