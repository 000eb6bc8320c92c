//! Audio pipeline: WAV container codec, PCM primitives, chunked input and
//! playback sinks.

pub mod dsp;
pub mod output;
pub mod source;
pub mod types;
pub mod wav;

pub use output::{build_sink, CommandSink, DirectorySink, NullSink, PlaybackSink};
pub use source::AudioSource;
pub use types::{AudioFormat, PcmChunk};
