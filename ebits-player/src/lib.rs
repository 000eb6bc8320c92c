//! # EBITS Player Library (ebits-player)
//!
//! Interpreter for EBITS scripts: four-symbol binary opcodes that drive
//! playback manipulation of WAV audio.
//!
//! **Pipeline:** script bytes → tokenizer → validator → executor, with the
//! executor pulling bounded PCM chunks from the audio source, applying the
//! DSP primitives and handing re-encoded WAV buffers to a playback sink.

pub mod audio;
pub mod config;
pub mod error;
pub mod playback;
pub mod script;

pub use error::{Error, Result};
pub use playback::{Executor, RunSummary};
pub use script::{parse_script, Script};
