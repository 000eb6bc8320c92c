//! Test helper modules for ebits-player integration tests
//!
//! - audio_generator: deterministic WAV fixtures written with hound
//! - sinks: recording and failing playback sinks, recording observer

#![allow(dead_code, unused_imports)]

pub mod audio_generator;
pub mod sinks;

pub use audio_generator::{generate_ramp_wav, generate_silent_wav, TestWav};
pub use sinks::{FailingSink, RecordingObserver, RecordingSink};
