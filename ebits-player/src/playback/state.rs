//! Playback state for one execution run

use crate::script::JumpTarget;
use ebits_common::events::{PlaybackStatus, StateSnapshot};
use serde::Serialize;

pub const MIN_SPEED: f64 = 0.5;
pub const MAX_SPEED: f64 = 2.0;
pub const MIN_VOLUME: f64 = 0.0;
pub const MAX_VOLUME: f64 = 2.0;

/// Fixed increment for SPEED_UP/SPEED_DOWN and VOLUME_UP/VOLUME_DOWN
pub const STEP: f64 = 0.1;

/// Seek, speed and volume applied by PLAY
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Modifiers {
    /// Seconds dropped from the start of the chunk
    pub seek_seconds: f64,
    pub speed: f64,
    pub volume: f64,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            seek_seconds: 0.0,
            speed: 1.0,
            volume: 1.0,
        }
    }
}

/// Add `delta` and snap to one decimal so repeated steps land on exact tenths
fn step(value: f64, delta: f64, min: f64, max: f64) -> f64 {
    (((value + delta) * 10.0).round() / 10.0).clamp(min, max)
}

impl Modifiers {
    pub fn forward(&mut self, seconds: f64) {
        self.seek_seconds += seconds;
    }

    /// Never goes below zero
    pub fn backward(&mut self, seconds: f64) {
        self.seek_seconds = (self.seek_seconds - seconds).max(0.0);
    }

    pub fn jump(&mut self, target: JumpTarget) {
        self.seek_seconds = match target {
            JumpTarget::Absolute(seconds) => seconds as f64,
            JumpTarget::Relative(offset) => (self.seek_seconds + offset as f64).max(0.0),
        };
    }

    pub fn volume_up(&mut self) {
        self.volume = step(self.volume, STEP, MIN_VOLUME, MAX_VOLUME);
    }

    pub fn volume_down(&mut self) {
        self.volume = step(self.volume, -STEP, MIN_VOLUME, MAX_VOLUME);
    }

    pub fn speed_up(&mut self) {
        self.speed = step(self.speed, STEP, MIN_SPEED, MAX_SPEED);
    }

    pub fn speed_down(&mut self) {
        self.speed = step(self.speed, -STEP, MIN_SPEED, MAX_SPEED);
    }
}

/// Mutable state of one run, owned by the executor
#[derive(Debug, Clone, Default)]
pub struct PlaybackState {
    /// Modifiers in effect for the chunk being replayed
    pub modifiers: Modifiers,
    pub status: PlaybackStatus,
    /// Set by HALT; ends the run
    pub halted: bool,
    /// Last REPEAT count (1 until a REPEAT runs)
    pub repeat_count: u32,
    /// Mnemonic of every dispatched instruction, in order
    pub history: Vec<&'static str>,
    /// Source line of the instruction being dispatched
    pub current_line: Option<usize>,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self {
            repeat_count: 1,
            ..Default::default()
        }
    }

    /// Update the status, returning the previous one if it changed
    pub fn set_status(&mut self, status: PlaybackStatus) -> Option<PlaybackStatus> {
        let old = self.status;
        self.status = status;
        (old != status).then_some(old)
    }

    pub fn record(&mut self, mnemonic: &'static str, line: usize) {
        self.history.push(mnemonic);
        self.current_line = Some(line);
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            status: self.status,
            seek_seconds: self.modifiers.seek_seconds,
            speed: self.modifiers.speed,
            volume: self.modifiers.volume,
            repeat_count: self.repeat_count,
            halted: self.halted,
            history_len: self.history.len(),
            current_line: self.current_line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = PlaybackState::new();
        assert_eq!(state.status, PlaybackStatus::Halted);
        assert!(!state.halted);
        assert_eq!(state.repeat_count, 1);
        assert_eq!(state.modifiers, Modifiers::default());
        assert_eq!(state.snapshot().current_line, None);
    }

    #[test]
    fn test_volume_clamps() {
        let mut m = Modifiers::default();
        for _ in 0..15 {
            m.volume_up();
        }
        assert_eq!(m.volume, 2.0);
        for _ in 0..25 {
            m.volume_down();
        }
        assert_eq!(m.volume, 0.0);
        m.volume_up();
        assert_eq!(m.volume, 0.1);
    }

    #[test]
    fn test_speed_clamps() {
        let mut m = Modifiers::default();
        for _ in 0..6 {
            m.speed_down();
        }
        assert_eq!(m.speed, 0.5);
        for _ in 0..20 {
            m.speed_up();
        }
        assert_eq!(m.speed, 2.0);
    }

    #[test]
    fn test_seek_moves() {
        let mut m = Modifiers::default();
        m.forward(5.0);
        m.backward(2.0);
        assert_eq!(m.seek_seconds, 3.0);
        m.backward(10.0);
        assert_eq!(m.seek_seconds, 0.0);

        m.jump(JumpTarget::Absolute(90));
        assert_eq!(m.seek_seconds, 90.0);
        m.jump(JumpTarget::Relative(-30));
        assert_eq!(m.seek_seconds, 60.0);
        m.jump(JumpTarget::Relative(-100));
        assert_eq!(m.seek_seconds, 0.0);
    }

    #[test]
    fn test_set_status_reports_changes_only() {
        let mut state = PlaybackState::new();
        assert_eq!(state.set_status(PlaybackStatus::Playing), Some(PlaybackStatus::Halted));
        assert_eq!(state.set_status(PlaybackStatus::Playing), None);
    }

    #[test]
    fn test_snapshot_reflects_history() {
        let mut state = PlaybackState::new();
        state.record("PLAY", 1);
        state.record("HALT", 2);
        let snap = state.snapshot();
        assert_eq!(snap.history_len, 2);
        assert_eq!(snap.current_line, Some(2));
    }
}
