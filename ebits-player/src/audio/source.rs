//! Audio source: input discovery and chunked PCM streaming
//!
//! Resolves a file or directory into an ordered list of WAV files, checks that
//! every file shares one [`AudioFormat`], then streams their PCM as bounded
//! chunks, file by file. Only the container layout is read up front; PCM bytes
//! are read lazily, one chunk at a time.

use super::types::{AudioFormat, PcmChunk};
use super::wav::{self, WavLayout};
use crate::error::{Error, Result};
use async_stream::try_stream;
use ebits_common::human_time::format_seconds;
use futures::Stream;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// One probed input file
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub layout: WavLayout,
}

/// A resolved, format-checked set of WAV inputs.
///
/// Consumed by [`AudioSource::chunks`]; open a new source to replay.
#[derive(Debug)]
pub struct AudioSource {
    files: Vec<SourceFile>,
    format: AudioFormat,
    max_chunk_bytes: usize,
}

impl AudioSource {
    /// Discover and probe the inputs under `path`.
    ///
    /// # Errors
    /// - `PathNotFound` if `path` does not exist
    /// - `NoAudioFiles` if a directory holds no `.wav` files
    /// - `AudioFile` wrapping a container error for the failing file
    /// - `FormatMismatch` if any file disagrees with the first one
    pub async fn open(
        path: impl AsRef<Path>,
        max_chunk_bytes: usize,
        recursive: bool,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let files = tokio::task::spawn_blocking(move || -> Result<Vec<SourceFile>> {
            discover(&path, recursive)?
                .into_iter()
                .map(probe)
                .collect()
        })
        .await
        .map_err(|e| Error::Config(format!("audio probe task failed: {}", e)))??;

        let format = check_formats(&files)?;

        let total: u64 = files.iter().map(|f| f.layout.data_len).sum();
        info!(
            "Audio source ready: {} file(s), {}, {} PCM bytes ({})",
            files.len(),
            format,
            total,
            format_seconds(format.duration_seconds(total as usize))
        );

        Ok(Self {
            files,
            format,
            max_chunk_bytes: max_chunk_bytes.max(1),
        })
    }

    /// Format shared by every input file
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Input files in playback order
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Total PCM bytes across all files
    pub fn total_pcm_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.layout.data_len).sum()
    }

    /// Stream the PCM of every file as frame-aligned chunks of at most
    /// `max_chunk_bytes` (at least one frame).
    ///
    /// Each file handle is opened when its first chunk is needed and dropped
    /// after its last chunk or on error.
    pub fn chunks(self) -> impl Stream<Item = Result<PcmChunk>> {
        let AudioSource {
            files,
            format,
            max_chunk_bytes,
        } = self;
        let frame = format.block_align().max(1) as u64;
        let chunk_len = ((max_chunk_bytes as u64 / frame) * frame).max(frame);

        try_stream! {
            let mut index = 0usize;

            for (file_index, file) in files.into_iter().enumerate() {
                let path = file.path;
                let mut handle = tokio::fs::File::open(&path)
                    .await
                    .map_err(|e| Error::from(e).in_file(&path))?;
                handle
                    .seek(SeekFrom::Start(file.layout.data_offset))
                    .await
                    .map_err(|e| Error::from(e).in_file(&path))?;

                let trailing = file.layout.data_len % frame;
                if trailing != 0 {
                    warn!(
                        "{}: dropping {} trailing byte(s) of a partial frame",
                        path.display(),
                        trailing
                    );
                }
                let mut remaining = file.layout.data_len - trailing;
                debug!("Streaming {} ({} bytes)", path.display(), remaining);

                while remaining > 0 {
                    let len = remaining.min(chunk_len) as usize;
                    let mut pcm = vec![0u8; len];
                    handle
                        .read_exact(&mut pcm)
                        .await
                        .map_err(|e| Error::from(e).in_file(&path))?;
                    remaining -= len as u64;

                    yield PcmChunk {
                        pcm,
                        format,
                        index,
                        file_index,
                    };
                    index += 1;
                }
            }
        }
    }
}

/// Resolve `path` into WAV files in path order.
///
/// A file path is returned as-is. A directory is scanned for regular files
/// with a `.wav` extension (any case), one level deep unless `recursive`.
pub fn discover(path: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let metadata = std::fs::metadata(path).map_err(|_| Error::PathNotFound(path.to_path_buf()))?;
    if !metadata.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let walker = WalkDir::new(path)
        .follow_links(true)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .sort_by_file_name();

    let mut files = Vec::new();
    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && is_wav(entry.path()) {
                    files.push(entry.into_path());
                }
            }
            Err(e) => warn!("Skipping unreadable entry under {}: {}", path.display(), e),
        }
    }

    if files.is_empty() {
        return Err(Error::NoAudioFiles(path.to_path_buf()));
    }

    files.sort();
    debug!("Discovered {} WAV file(s) under {}", files.len(), path.display());
    Ok(files)
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("wav"))
        .unwrap_or(false)
}

fn probe(path: PathBuf) -> Result<SourceFile> {
    let layout = std::fs::File::open(&path)
        .map_err(Error::from)
        .and_then(|file| wav::read_layout(&mut std::io::BufReader::new(file)))
        .map_err(|e| e.in_file(&path))?;

    if !layout.fmt.is_integer_pcm() {
        warn!(
            "{}: format tag {:#06x} is not integer PCM, samples are read as raw integers",
            path.display(),
            layout.fmt.format_tag
        );
    }
    if layout.fmt.format().block_align() == 0 {
        return Err(
            Error::InvalidContainer("zero channels or bit depth".to_string()).in_file(&path)
        );
    }

    Ok(SourceFile { path, layout })
}

fn check_formats(files: &[SourceFile]) -> Result<AudioFormat> {
    let expected = match files.first() {
        Some(first) => first.layout.fmt.format(),
        None => return Err(Error::Config("no audio inputs".to_string())),
    };

    for file in &files[1..] {
        let actual = file.layout.fmt.format();
        if actual != expected {
            return Err(Error::FormatMismatch {
                path: file.path.clone(),
                expected,
                actual,
            });
        }
    }

    Ok(expected)
}
