//! Playback: run state, observer interface and the instruction executor

pub mod executor;
pub mod observer;
pub mod state;

pub use executor::{Executor, RunSummary};
pub use observer::{NoopObserver, PlaybackObserver};
pub use state::{Modifiers, PlaybackState};
