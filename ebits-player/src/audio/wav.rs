//! RIFF/WAVE container codec
//!
//! Decoding walks the chunk list after the 12-byte `RIFF....WAVE` preamble until
//! both a `fmt ` chunk and a `data` chunk have been seen. Encoding always emits
//! the canonical 44-byte PCM header followed by the PCM bytes verbatim.
//!
//! All integer fields are little-endian.

use super::types::AudioFormat;
use crate::error::{Error, Result};
use std::io::{Cursor, Read, Seek, SeekFrom};
use tracing::{debug, warn};

/// Length of the `RIFF <size> WAVE` preamble
pub const PREAMBLE_LEN: usize = 12;

/// Length of the header written by [`encode`]
pub const CANONICAL_HEADER_LEN: usize = 44;

/// `fmt ` format tag for integer PCM
pub const FORMAT_TAG_PCM: u16 = 1;

/// `fmt ` format tag for WAVE_FORMAT_EXTENSIBLE
pub const FORMAT_TAG_EXTENSIBLE: u16 = 0xFFFE;

/// Minimum body size of a `fmt ` chunk
const FMT_BODY_LEN: u32 = 16;

/// RIFF size of a canonical file minus its PCM: "WAVE", the fmt chunk and the
/// data chunk header
const RIFF_FORM_OVERHEAD: u32 = 36;

/// Contents of the `fmt ` chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FmtChunk {
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl FmtChunk {
    fn parse(body: &[u8; FMT_BODY_LEN as usize]) -> Self {
        Self {
            format_tag: u16::from_le_bytes([body[0], body[1]]),
            channels: u16::from_le_bytes([body[2], body[3]]),
            sample_rate: u32::from_le_bytes([body[4], body[5], body[6], body[7]]),
            byte_rate: u32::from_le_bytes([body[8], body[9], body[10], body[11]]),
            block_align: u16::from_le_bytes([body[12], body[13]]),
            bits_per_sample: u16::from_le_bytes([body[14], body[15]]),
        }
    }

    /// Format descriptor used by the rest of the pipeline
    pub fn format(&self) -> AudioFormat {
        AudioFormat::new(self.channels, self.sample_rate, self.bits_per_sample)
    }

    /// Whether the samples are integer PCM
    pub fn is_integer_pcm(&self) -> bool {
        matches!(self.format_tag, FORMAT_TAG_PCM | FORMAT_TAG_EXTENSIBLE)
    }
}

/// Where the pieces of a WAV container live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavLayout {
    pub fmt: FmtChunk,
    /// Byte offset of the first PCM byte
    pub data_offset: u64,
    /// Number of PCM bytes (clamped to what the container actually holds)
    pub data_len: u64,
}

/// A fully decoded in-memory WAV buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedWav {
    pub format: AudioFormat,
    pub fmt: FmtChunk,
    pub pcm: Vec<u8>,
}

/// Locate the `fmt ` and `data` chunks of a WAV container.
///
/// Reads only chunk headers and the `fmt ` body, seeking over everything else,
/// so it works on an open file without loading the PCM.
///
/// # Errors
/// - `InvalidContainer` if the preamble is not `RIFF....WAVE` or a `fmt `
///   chunk is truncated
/// - `MissingChunk` if either required chunk is absent by end of input
pub fn read_layout<R: Read + Seek>(reader: &mut R) -> Result<WavLayout> {
    let total_len = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(0))?;

    if total_len < PREAMBLE_LEN as u64 {
        return Err(Error::InvalidContainer(format!(
            "{} bytes is shorter than the 12-byte RIFF preamble",
            total_len
        )));
    }

    let mut preamble = [0u8; PREAMBLE_LEN];
    reader.read_exact(&mut preamble)?;
    if &preamble[0..4] != b"RIFF" || &preamble[8..12] != b"WAVE" {
        return Err(Error::InvalidContainer(
            "missing RIFF/WAVE preamble".to_string(),
        ));
    }

    let mut fmt: Option<FmtChunk> = None;
    let mut data: Option<(u64, u64)> = None;
    let mut offset = PREAMBLE_LEN as u64;

    while offset + 8 <= total_len && (fmt.is_none() || data.is_none()) {
        reader.seek(SeekFrom::Start(offset))?;
        let mut header = [0u8; 8];
        reader.read_exact(&mut header)?;

        let chunk_id = [header[0], header[1], header[2], header[3]];
        let chunk_size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        let body_start = offset + 8;

        match &chunk_id {
            b"fmt " if fmt.is_none() => {
                if chunk_size < FMT_BODY_LEN || body_start + FMT_BODY_LEN as u64 > total_len {
                    return Err(Error::InvalidContainer(format!(
                        "fmt chunk truncated ({} bytes declared)",
                        chunk_size
                    )));
                }
                let mut body = [0u8; FMT_BODY_LEN as usize];
                reader.read_exact(&mut body)?;
                fmt = Some(FmtChunk::parse(&body));
            }
            b"data" if data.is_none() => {
                let available = total_len - body_start;
                let len = u64::from(chunk_size).min(available);
                if len < u64::from(chunk_size) {
                    warn!(
                        "data chunk declares {} bytes but only {} are present; truncating",
                        chunk_size, available
                    );
                }
                data = Some((body_start, len));
            }
            _ => {
                debug!(
                    "Skipping chunk '{}' ({} bytes)",
                    String::from_utf8_lossy(&chunk_id),
                    chunk_size
                );
            }
        }

        // RIFF chunks are word-aligned: odd sizes carry one pad byte
        offset = body_start + u64::from(chunk_size) + u64::from(chunk_size & 1);
    }

    let fmt = fmt.ok_or(Error::MissingChunk("fmt "))?;
    let (data_offset, data_len) = data.ok_or(Error::MissingChunk("data"))?;

    Ok(WavLayout {
        fmt,
        data_offset,
        data_len,
    })
}

/// Decode an in-memory WAV buffer into its format and PCM bytes.
pub fn decode(bytes: &[u8]) -> Result<DecodedWav> {
    let layout = read_layout(&mut Cursor::new(bytes))?;

    let start = layout.data_offset as usize;
    let end = start + layout.data_len as usize;
    let pcm = bytes[start..end].to_vec();

    Ok(DecodedWav {
        format: layout.fmt.format(),
        fmt: layout.fmt,
        pcm,
    })
}

/// Encode PCM bytes as a canonical 44-byte-header PCM WAV buffer.
///
/// `byte_rate = sample_rate * channels * bits / 8`,
/// `block_align = channels * bits / 8`; the RIFF and data sizes come from
/// `pcm.len()`.
///
/// # Errors
/// `PcmTooLarge` when `pcm` is too long for the 32-bit RIFF size field.
pub fn encode(pcm: &[u8], format: AudioFormat) -> Result<Vec<u8>> {
    let bits = u64::from(format.bits_per_sample);
    let channels = u64::from(format.channels);
    let byte_rate = u32::try_from(u64::from(format.sample_rate) * channels * bits / 8)
        .map_err(|_| Error::InvalidContainer(format!("byte rate of {} overflows", format)))?;
    let block_align = u16::try_from(channels * bits / 8)
        .map_err(|_| Error::InvalidContainer(format!("block align of {} overflows", format)))?;
    let data_size = data_size_field(pcm.len())?;

    let mut out = Vec::with_capacity(CANONICAL_HEADER_LEN + pcm.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(RIFF_FORM_OVERHEAD + data_size).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&FMT_BODY_LEN.to_le_bytes());
    out.extend_from_slice(&FORMAT_TAG_PCM.to_le_bytes());
    out.extend_from_slice(&format.channels.to_le_bytes());
    out.extend_from_slice(&format.sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&format.bits_per_sample.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());
    out.extend_from_slice(pcm);
    Ok(out)
}

fn data_size_field(len: usize) -> Result<u32> {
    u32::try_from(len)
        .ok()
        .filter(|size| size.checked_add(RIFF_FORM_OVERHEAD).is_some())
        .ok_or(Error::PcmTooLarge(len))
}
