//! Playback sinks
//!
//! A sink receives one complete WAV buffer per PLAY dispatch and reports
//! success or a `Sink` error. The executor never looks past this boundary.
//!
//! - [`CommandSink`]: pipe the buffer into an external player's stdin
//! - [`DirectorySink`]: write numbered `.wav` files
//! - [`NullSink`]: discard (dry run)
//! - `DeviceSink`: default output device via cpal (`device-output` feature)

use crate::error::{Error, Result};
use async_trait::async_trait;
use ebits_common::config::{SinkConfig, SinkKind};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Renders WAV buffers handed over by the executor
#[async_trait]
pub trait PlaybackSink: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Render one complete WAV buffer; resolves once rendering finished or failed
    async fn play(&self, wav: Vec<u8>) -> Result<()>;
}

/// Build the sink selected by configuration
pub fn build_sink(config: &SinkConfig) -> Result<Arc<dyn PlaybackSink>> {
    let sink: Arc<dyn PlaybackSink> = match config.kind {
        SinkKind::Command => Arc::new(CommandSink::new(config.command.clone())?),
        SinkKind::Directory => Arc::new(DirectorySink::new(config.output_dir.clone())?),
        SinkKind::Null => Arc::new(NullSink),
        #[cfg(feature = "device-output")]
        SinkKind::Device => Arc::new(device::DeviceSink),
        #[cfg(not(feature = "device-output"))]
        SinkKind::Device => {
            return Err(Error::Config(
                "sink kind 'device' needs a build with the device-output feature".to_string(),
            ))
        }
    };
    info!("Playback sink: {}", sink.name());
    Ok(sink)
}

/// Spawns `program args...` per buffer and writes the WAV to its stdin.
#[derive(Debug, Clone)]
pub struct CommandSink {
    program: String,
    args: Vec<String>,
}

impl CommandSink {
    pub fn new(argv: Vec<String>) -> Result<Self> {
        let mut argv = argv.into_iter();
        let program = argv
            .next()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| Error::Config("player command is empty".to_string()))?;
        Ok(Self {
            program,
            args: argv.collect(),
        })
    }
}

#[async_trait]
impl PlaybackSink for CommandSink {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn play(&self, wav: Vec<u8>) -> Result<()> {
        debug!("Spawning {} for {} bytes", self.program, wav.len());

        let mut child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Sink(format!("failed to start '{}': {}", self.program, e)))?;

        // stdin is written while stderr drains
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(&wav).await?;
            }
            // Dropping stdin closes the pipe and signals end of stream
            Ok::<(), std::io::Error>(())
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());

        let output = output
            .map_err(|e| Error::Sink(format!("waiting for '{}' failed: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Sink(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        fed.map_err(|e| Error::Sink(format!("writing to '{}' failed: {}", self.program, e)))?;

        Ok(())
    }
}

/// Writes each buffer to `dispatch-NNNN.wav` under a directory.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    counter: AtomicUsize,
}

impl DirectorySink {
    /// Creates the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            counter: AtomicUsize::new(0),
        })
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }
}

#[async_trait]
impl PlaybackSink for DirectorySink {
    fn name(&self) -> &'static str {
        "directory"
    }

    async fn play(&self, wav: Vec<u8>) -> Result<()> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let path = self.dir.join(format!("dispatch-{:04}.wav", n));
        tokio::fs::write(&path, &wav)
            .await
            .map_err(|e| Error::Sink(format!("{}: {}", path.display(), e)))?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

/// Accepts and drops every buffer
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

#[async_trait]
impl PlaybackSink for NullSink {
    fn name(&self) -> &'static str {
        "null"
    }

    async fn play(&self, wav: Vec<u8>) -> Result<()> {
        debug!("Discarding {} byte buffer", wav.len());
        Ok(())
    }
}

#[cfg(feature = "device-output")]
mod device {
    use super::PlaybackSink;
    use crate::audio::wav;
    use crate::error::{Error, Result};
    use async_trait::async_trait;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{BufferSize, SampleRate, StreamConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};
    use std::time::Duration;
    use tracing::{info, warn};

    /// Plays each buffer on the default output device, blocking until drained.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct DeviceSink;

    #[async_trait]
    impl PlaybackSink for DeviceSink {
        fn name(&self) -> &'static str {
            "device"
        }

        async fn play(&self, wav: Vec<u8>) -> Result<()> {
            tokio::task::spawn_blocking(move || play_blocking(&wav))
                .await
                .map_err(|e| Error::Sink(format!("device task failed: {}", e)))?
        }
    }

    fn play_blocking(buffer: &[u8]) -> Result<()> {
        let decoded = wav::decode(buffer).map_err(|e| Error::Sink(e.to_string()))?;
        let format = decoded.format;
        let samples = Arc::new(to_f32_samples(&decoded.pcm, format.bits_per_sample)?);

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Sink("No default output device found".to_string()))?;
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        info!("Playing {} samples on {}", samples.len(), name);

        let config = StreamConfig {
            channels: format.channels,
            sample_rate: SampleRate(format.sample_rate),
            buffer_size: BufferSize::Default,
        };

        let position = Arc::new(AtomicUsize::new(0));
        let (done_tx, done_rx) = mpsc::channel::<std::result::Result<(), String>>();
        let error_tx = done_tx.clone();

        let callback_samples = Arc::clone(&samples);
        let callback_position = Arc::clone(&position);
        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let start = callback_position.load(Ordering::Relaxed);
                    for (i, out) in data.iter_mut().enumerate() {
                        *out = callback_samples.get(start + i).copied().unwrap_or(0.0);
                    }
                    let next = start + data.len();
                    callback_position.store(next, Ordering::Relaxed);
                    if start < callback_samples.len() && next >= callback_samples.len() {
                        let _ = done_tx.send(Ok(()));
                    }
                },
                move |err| {
                    warn!("Audio stream error: {}", err);
                    let _ = error_tx.send(Err(err.to_string()));
                },
                None,
            )
            .map_err(|e| Error::Sink(format!("Failed to build output stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| Error::Sink(format!("Failed to start output stream: {}", e)))?;

        if samples.is_empty() {
            return Ok(());
        }

        let expected = format.duration_seconds(decoded.pcm.len());
        let timeout = Duration::from_secs_f64(expected + 2.0);
        match done_rx.recv_timeout(timeout) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(message)) => Err(Error::Sink(message)),
            Err(_) => Err(Error::Sink(format!(
                "device did not drain {:.2}s of audio within {:.2}s",
                expected,
                timeout.as_secs_f64()
            ))),
        }
    }

    /// Widths the DSP primitives never produce still come back as a `Sink`
    /// error so the run moves on to the next chunk.
    fn to_f32_samples(pcm: &[u8], bits: u16) -> Result<Vec<f32>> {
        match bits {
            8 => Ok(pcm.iter().map(|&b| b as i8 as f32 / 128.0).collect()),
            16 => Ok(pcm
                .chunks_exact(2)
                .map(|p| i16::from_le_bytes([p[0], p[1]]) as f32 / 32768.0)
                .collect()),
            other => Err(Error::Sink(format!(
                "device output supports 8 or 16-bit PCM, got {} bits",
                other
            ))),
        }
    }

}

#[cfg(feature = "device-output")]
pub use device::DeviceSink;
