//! Core audio data types
//!
//! Defines the format descriptor and the PCM chunk that flow from the audio
//! source through the executor.
//!
//! **Format:**
//! - Samples are raw little-endian integer PCM exactly as stored in the WAV file
//! - Multi-channel data is interleaved: [ch0, ch1, ch0, ch1, ...]
//! - 8-bit samples are treated as signed bytes by the DSP primitives

use serde::Serialize;

/// Channel count, sample rate and bit depth of a PCM stream.
///
/// Every chunk in one execution run shares exactly one AudioFormat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AudioFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl AudioFormat {
    pub fn new(channels: u16, sample_rate: u32, bits_per_sample: u16) -> Self {
        Self {
            channels,
            sample_rate,
            bits_per_sample,
        }
    }

    /// Bytes per single-channel sample (1 for 8-bit, 2 for 16-bit)
    pub fn bytes_per_sample(&self) -> usize {
        (self.bits_per_sample as usize).div_ceil(8)
    }

    /// Bytes per frame (one sample for every channel)
    pub fn block_align(&self) -> usize {
        self.bytes_per_sample() * self.channels as usize
    }

    /// Bytes per second of audio
    pub fn byte_rate(&self) -> u64 {
        self.sample_rate as u64 * self.block_align() as u64
    }

    /// Duration in seconds of `byte_len` PCM bytes
    pub fn duration_seconds(&self, byte_len: usize) -> f64 {
        let rate = self.byte_rate();
        if rate == 0 {
            return 0.0;
        }
        byte_len as f64 / rate as f64
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let layout = match self.channels {
            1 => "mono".to_string(),
            2 => "stereo".to_string(),
            n => format!("{} channels", n),
        };
        write!(
            f,
            "{} Hz/{}/{}-bit",
            self.sample_rate, layout, self.bits_per_sample
        )
    }
}

/// A bounded, sample-aligned slice of one file's PCM stream.
///
/// Chunks never split a sample: `pcm.len()` is always a multiple of the
/// format's sample width.
#[derive(Debug, Clone)]
pub struct PcmChunk {
    /// Raw PCM bytes
    pub pcm: Vec<u8>,

    /// Format shared by every chunk of the run
    pub format: AudioFormat,

    /// Position of the chunk in the run (0-based, across all files)
    pub index: usize,

    /// Index of the input file the chunk came from
    pub file_index: usize,
}

impl PcmChunk {
    /// Duration of the chunk in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.format.duration_seconds(self.pcm.len())
    }
}
