//! PCM buffer primitives
//!
//! Pure functions over whole-sample-aligned little-endian PCM. Only 8-bit
//! (treated as signed bytes) and 16-bit samples are supported; every primitive
//! that looks at sample width rejects anything else with
//! `UnsupportedSampleWidth`.
//!
//! The speed change is a nearest-index decimation/duplication: duration and
//! pitch change together, there is no band-limiting.

use crate::error::{Error, Result};

/// Bytes per sample for a supported bit depth
fn sample_width(bits_per_sample: u16) -> Result<usize> {
    match bits_per_sample {
        8 => Ok(1),
        16 => Ok(2),
        other => Err(Error::UnsupportedSampleWidth(other)),
    }
}

/// Scale every sample by `gain`, rounding to nearest and clipping to the
/// signed range of the bit depth.
pub fn set_volume(pcm: &[u8], bits_per_sample: u16, gain: f64) -> Result<Vec<u8>> {
    let width = sample_width(bits_per_sample)?;
    let mut out = Vec::with_capacity(pcm.len());

    match width {
        1 => {
            for &byte in pcm {
                let sample = byte as i8 as f64;
                let scaled = (sample * gain).round().clamp(i8::MIN as f64, i8::MAX as f64);
                out.push(scaled as i8 as u8);
            }
        }
        _ => {
            for pair in pcm.chunks_exact(2) {
                let sample = i16::from_le_bytes([pair[0], pair[1]]) as f64;
                let scaled = (sample * gain)
                    .round()
                    .clamp(i16::MIN as f64, i16::MAX as f64);
                out.extend_from_slice(&(scaled as i16).to_le_bytes());
            }
        }
    }

    Ok(out)
}

/// Resample by nearest-index selection.
///
/// Produces `floor(sample_count / factor)` samples where output sample `i` is
/// input sample `floor(i * factor)`. `factor == 1` returns a copy.
pub fn change_speed(pcm: &[u8], bits_per_sample: u16, factor: f64) -> Result<Vec<u8>> {
    let width = sample_width(bits_per_sample)?;
    if factor == 1.0 {
        return Ok(pcm.to_vec());
    }
    if !factor.is_finite() || factor <= 0.0 {
        return Err(Error::Config(format!("invalid speed factor {}", factor)));
    }

    let sample_count = pcm.len() / width;
    let out_count = (sample_count as f64 / factor).floor() as usize;
    let mut out = Vec::with_capacity(out_count * width);

    for i in 0..out_count {
        let src = ((i as f64 * factor).floor() as usize).min(sample_count.saturating_sub(1));
        let start = src * width;
        out.extend_from_slice(&pcm[start..start + width]);
    }

    Ok(out)
}

/// Drop the leading `floor(sample_rate * channels * seconds)` samples.
///
/// Returns an empty buffer when the offset reaches or passes the end.
pub fn seek(
    pcm: &[u8],
    bits_per_sample: u16,
    channels: u16,
    sample_rate: u32,
    seconds: f64,
) -> Result<Vec<u8>> {
    let width = sample_width(bits_per_sample)?;
    if seconds <= 0.0 {
        return Ok(pcm.to_vec());
    }

    let samples = (sample_rate as f64 * channels as f64 * seconds).floor();
    let offset = samples * width as f64;
    if offset >= pcm.len() as f64 {
        return Ok(Vec::new());
    }

    Ok(pcm[offset as usize..].to_vec())
}

/// Concatenate `times` copies of the buffer; `times <= 1` returns a copy.
pub fn repeat(pcm: &[u8], times: u32) -> Vec<u8> {
    if times <= 1 {
        return pcm.to_vec();
    }
    pcm.repeat(times as usize)
}
