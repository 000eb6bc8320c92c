//! Resolved runtime configuration for execubits
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments
//! 2. Environment variables (`EBITS_*`, read by clap)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! The TOML schema and file lookup live in `ebits_common::config`; this module
//! folds the command-line layer on top and checks the result.

use crate::error::{Error, Result};
use ebits_common::config::{resolve_config_path, ContinuityMode, SinkConfig, SinkKind, TomlConfig};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Values given on the command line (or through their env fallbacks).
/// `None` leaves the lower layer in place.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub max_chunk_bytes: Option<usize>,
    pub recursive: Option<bool>,
    pub continuity: Option<ContinuityMode>,
    pub sink_kind: Option<SinkKind>,
    pub output_dir: Option<PathBuf>,
    pub player_command: Option<Vec<String>>,
    pub log_level: Option<String>,
}

/// Effective configuration of one execubits invocation
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    pub max_chunk_bytes: usize,
    pub recursive: bool,
    pub continuity: ContinuityMode,
    pub sink: SinkConfig,
    pub log_level: String,
    /// TOML file that was read, if any
    pub source_file: Option<PathBuf>,
    /// Config file that was asked for but does not exist
    pub missing_file: Option<PathBuf>,
}

impl PlayerConfig {
    /// Locate and read the TOML layer, then apply `overrides`
    pub fn load(explicit: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let path = resolve_config_path(explicit);
        let toml = TomlConfig::load_or_default(path.as_deref())?;
        let mut config = Self::resolve(toml, overrides)?;
        match path {
            Some(path) if path.exists() => config.source_file = Some(path),
            Some(path) => config.missing_file = Some(path),
            None => {}
        }
        Ok(config)
    }

    /// Merge a parsed TOML layer with command-line overrides
    pub fn resolve(toml: TomlConfig, overrides: Overrides) -> Result<Self> {
        let mut sink = toml.sink;
        if let Some(kind) = overrides.sink_kind {
            sink.kind = kind;
        }
        if let Some(dir) = overrides.output_dir {
            sink.output_dir = dir;
        }
        if let Some(command) = overrides.player_command {
            sink.command = command;
        }

        let config = Self {
            max_chunk_bytes: overrides.max_chunk_bytes.unwrap_or(toml.audio.max_chunk_bytes),
            recursive: overrides.recursive.unwrap_or(toml.audio.recursive),
            continuity: overrides.continuity.unwrap_or(toml.playback.continuity),
            sink,
            log_level: overrides.log_level.unwrap_or(toml.logging.level),
            source_file: None,
            missing_file: None,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.max_chunk_bytes == 0 {
            return Err(Error::Config("max_chunk_bytes must be greater than zero".to_string()));
        }
        if self.sink.kind == SinkKind::Command && self.sink.command.is_empty() {
            return Err(Error::Config("command sink needs a player command".to_string()));
        }
        Ok(())
    }

    /// Log the effective settings. Called once logging is up, so a missing
    /// config file is reported here rather than while loading.
    pub fn log_summary(&self) {
        if let Some(path) = &self.missing_file {
            warn!("Config file {} not found, using built-in defaults", path.display());
        }
        info!(
            "Config: chunk {} bytes, recursive {}, continuity {:?}, sink {:?}, file {}",
            self.max_chunk_bytes,
            self.recursive,
            self.continuity,
            self.sink.kind,
            self.source_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".to_string())
        );
    }
}
