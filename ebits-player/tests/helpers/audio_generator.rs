//! Audio test file generation
//!
//! Writes WAV fixtures with hound so the crate's own codec is checked against
//! an independent encoder.

use hound::{WavSpec, WavWriter};
use std::path::Path;

/// Shape of a generated fixture
#[derive(Debug, Clone, Copy)]
pub struct TestWav {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl TestWav {
    /// 8000 Hz mono 16-bit
    pub fn mono16() -> Self {
        Self {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
        }
    }

    fn spec(&self) -> WavSpec {
        WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
            sample_format: hound::SampleFormat::Int,
        }
    }

    fn sample_count(&self, duration_ms: u64) -> u64 {
        self.sample_rate as u64 * duration_ms / 1000 * self.channels as u64
    }
}

/// Generate an all-zero WAV file
pub fn generate_silent_wav<P: AsRef<Path>>(
    path: P,
    shape: TestWav,
    duration_ms: u64,
) -> Result<(), hound::Error> {
    let mut writer = WavWriter::create(path, shape.spec())?;
    for _ in 0..shape.sample_count(duration_ms) {
        match shape.bits_per_sample {
            8 => writer.write_sample(0i8)?,
            _ => writer.write_sample(0i16)?,
        }
    }
    writer.finalize()
}

/// Generate a WAV file whose samples count up from `start`, wrapping within
/// the bit depth, so chunk order and boundaries are visible in the PCM.
pub fn generate_ramp_wav<P: AsRef<Path>>(
    path: P,
    shape: TestWav,
    duration_ms: u64,
    start: i32,
) -> Result<(), hound::Error> {
    let mut writer = WavWriter::create(path, shape.spec())?;
    for i in 0..shape.sample_count(duration_ms) {
        let value = start + i as i32;
        match shape.bits_per_sample {
            8 => writer.write_sample(value as i8)?,
            _ => writer.write_sample(value as i16)?,
        }
    }
    writer.finalize()
}
