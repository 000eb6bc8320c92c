//! execubits - run an EBITS script against WAV audio
//!
//! ```text
//! execubits [OPTIONS] <SCRIPT> <AUDIO>
//! ```
//!
//! Exits non-zero when the script fails validation, the audio cannot be read,
//! or a non-recoverable error stops the run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use ebits_common::config::{ContinuityMode, SinkKind};
use ebits_common::events::EventBus;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ebits_player::audio::{build_sink, AudioSource};
use ebits_player::config::{Overrides, PlayerConfig};
use ebits_player::playback::{Executor, PlaybackObserver};
use ebits_player::script::load_script;

const SCRIPT_EXTENSION: &str = "ebits";

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("EBITS_GIT_HASH"),
    ", built ",
    env!("EBITS_BUILD_TIMESTAMP"),
    ", ",
    env!("EBITS_BUILD_PROFILE"),
    ")"
);

/// Command-line arguments for execubits
#[derive(Parser, Debug)]
#[command(name = "execubits")]
#[command(about = "Interpret an EBITS script against one or more WAV files")]
#[command(version, long_version = LONG_VERSION)]
struct Args {
    /// EBITS script file (.ebits)
    script: PathBuf,

    /// WAV file, or directory of WAV files played in path order
    audio: PathBuf,

    /// TOML configuration file
    #[arg(short, long, env = "EBITS_CONFIG")]
    config: Option<PathBuf>,

    /// Playback sink: command, directory, null or device
    #[arg(short, long, env = "EBITS_SINK")]
    sink: Option<SinkKind>,

    /// Output directory for the directory sink
    #[arg(short, long, env = "EBITS_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// External player command for the command sink (reads WAV on stdin)
    #[arg(long, env = "EBITS_PLAYER", num_args = 1.., value_delimiter = ' ')]
    player: Option<Vec<String>>,

    /// Upper bound on PCM bytes per chunk
    #[arg(long, env = "EBITS_CHUNK_BYTES")]
    chunk_bytes: Option<usize>,

    /// Descend into subdirectories of a directory input
    #[arg(short, long)]
    recursive: bool,

    /// Cross-chunk modifier behaviour: reset or carry
    #[arg(long, env = "EBITS_CONTINUITY")]
    continuity: Option<ContinuityMode>,

    /// Print run events to stdout as JSON lines
    #[arg(long)]
    events: bool,

    /// Log level (RUST_LOG takes precedence)
    #[arg(short, long, env = "EBITS_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = PlayerConfig::load(
        args.config.as_deref(),
        Overrides {
            max_chunk_bytes: args.chunk_bytes,
            recursive: args.recursive.then_some(true),
            continuity: args.continuity,
            sink_kind: args.sink,
            output_dir: args.output_dir.clone(),
            player_command: args.player.clone(),
            log_level: args.log_level.clone(),
        },
    )
    .context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "execubits={0},ebits_player={0},ebits_common={0}",
                    config.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("execubits {}", LONG_VERSION);
    config.log_summary();

    let script_path = check_script_path(&args.script)?;
    let script = load_script(&script_path)
        .await
        .with_context(|| format!("Invalid script {}", script_path.display()))?;

    let source = AudioSource::open(&args.audio, config.max_chunk_bytes, config.recursive)
        .await
        .with_context(|| format!("Failed to open audio {}", args.audio.display()))?;

    let sink = build_sink(&config.sink).context("Failed to set up playback sink")?;

    let bus = EventBus::new(256);
    let printer = args.events.then(|| spawn_event_printer(&bus));
    let observer: Arc<dyn PlaybackObserver> = Arc::new(bus);

    let mut executor = Executor::new(sink, observer, config.continuity);
    let summary = executor.run(script, source).await.context("Playback failed")?;

    // Dropping the executor closes the bus so the printer drains and exits
    drop(executor);
    if let Some(printer) = printer {
        if let Err(e) = printer.await {
            warn!("Event printer task failed: {}", e);
        }
    }

    info!(
        "Done: {} ({} dispatch(es), {} sink failure(s))",
        summary.status, summary.dispatches, summary.sink_failures
    );
    if summary.sink_failures > 0 {
        warn!("{} buffer(s) could not be played", summary.sink_failures);
    }

    Ok(())
}

/// The script must be an existing, non-empty regular file. A path without the
/// `.ebits` extension is accepted with a warning, unless `<path>.ebits` exists,
/// in which case that file is used instead.
fn check_script_path(path: &Path) -> Result<PathBuf> {
    let mut path = path.to_path_buf();

    if path.extension().and_then(|e| e.to_str()) != Some(SCRIPT_EXTENSION) {
        let mut with_ext = path.clone().into_os_string();
        with_ext.push(".");
        with_ext.push(SCRIPT_EXTENSION);
        let with_ext = PathBuf::from(with_ext);

        if !path.exists() && with_ext.is_file() {
            warn!("{} not found, using {}", path.display(), with_ext.display());
            path = with_ext;
        } else {
            warn!("Script {} does not have the .{} extension", path.display(), SCRIPT_EXTENSION);
        }
    }

    let metadata = std::fs::metadata(&path)
        .with_context(|| format!("Script {} does not exist", path.display()))?;
    if !metadata.is_file() {
        bail!("Script path {} is not a file", path.display());
    }
    if metadata.len() == 0 {
        bail!("Script {} is empty", path.display());
    }

    Ok(path)
}

fn spawn_event_printer(bus: &EventBus) -> tokio::task::JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(line) => println!("{}", line),
                    Err(e) => warn!("Failed to serialize event: {}", e),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event printer skipped {} event(s)", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
