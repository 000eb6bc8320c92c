//! Configuration loading and config file resolution
//!
//! Settings are layered, highest priority first:
//! 1. Command-line arguments (applied by the binary)
//! 2. Environment variables (applied by the binary through clap `env`)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! This module owns layers 3 and 4: the TOML schema with its defaults, and the
//! lookup of which TOML file (if any) to read.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "EBITS_CONFIG";

/// Reference upper bound for one PCM chunk (5 MiB)
pub const DEFAULT_MAX_CHUNK_BYTES: usize = 5 * 1024 * 1024;

/// Configuration loaded from TOML file
///
/// Every section and field is optional; anything missing takes its built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub sink: SinkConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Audio input settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AudioConfig {
    /// Upper bound on the PCM bytes carried by one chunk
    #[serde(default = "default_max_chunk_bytes")]
    pub max_chunk_bytes: usize,

    /// Descend into subdirectories when the audio path is a directory
    #[serde(default)]
    pub recursive: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            max_chunk_bytes: default_max_chunk_bytes(),
            recursive: false,
        }
    }
}

/// How seek/speed/volume modifiers behave across chunk boundaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContinuityMode {
    /// Every chunk starts from seek 0, speed 1.0, volume 1.0
    #[default]
    Reset,
    /// The modifiers at the end of one chunk seed the next chunk
    Carry,
}

impl std::str::FromStr for ContinuityMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "reset" => Ok(ContinuityMode::Reset),
            "carry" => Ok(ContinuityMode::Carry),
            other => Err(Error::InvalidInput(format!(
                "unknown continuity mode '{}' (expected 'reset' or 'carry')",
                other
            ))),
        }
    }
}

/// Playback behaviour settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlaybackConfig {
    #[serde(default)]
    pub continuity: ContinuityMode,
}

/// Which playback sink renders dispatched WAV buffers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Pipe each buffer into an external player process
    #[default]
    Command,
    /// Write each buffer to a numbered file in a directory
    Directory,
    /// Discard buffers (dry run)
    Null,
    /// Play on the default output device
    Device,
}

impl std::str::FromStr for SinkKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "command" => Ok(SinkKind::Command),
            "directory" | "dir" => Ok(SinkKind::Directory),
            "null" | "none" => Ok(SinkKind::Null),
            "device" => Ok(SinkKind::Device),
            other => Err(Error::InvalidInput(format!("unknown sink kind '{}'", other))),
        }
    }
}

/// Playback sink settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SinkConfig {
    #[serde(default)]
    pub kind: SinkKind,

    /// Program and arguments for the command sink; the WAV buffer arrives on stdin
    #[serde(default = "default_player_command")]
    pub command: Vec<String>,

    /// Target directory for the directory sink
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::default(),
            command: default_player_command(),
            output_dir: default_output_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_max_chunk_bytes() -> usize {
    DEFAULT_MAX_CHUNK_BYTES
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("ebits-out")
}

/// Platform default external player; each reads a WAV stream from stdin.
fn default_player_command() -> Vec<String> {
    let argv: &[&str] = if cfg!(target_os = "linux") {
        &["aplay", "-q", "-"]
    } else {
        &["ffplay", "-nodisp", "-autoexit", "-loglevel", "quiet", "-"]
    };
    argv.iter().map(|s| s.to_string()).collect()
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Load the resolved config file, or fall back to defaults when there is none.
    ///
    /// A missing file is not an error (warning + defaults); a file that exists
    /// but fails to parse is.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        match resolve_config_path(explicit) {
            Some(path) if path.exists() => {
                debug!("Loading configuration from {}", path.display());
                Self::load(&path)
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                debug!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.audio.max_chunk_bytes == 0 {
            return Err(Error::Config(
                "audio.max_chunk_bytes must be greater than zero".to_string(),
            ));
        }
        if self.sink.kind == SinkKind::Command && self.sink.command.is_empty() {
            return Err(Error::Config(
                "sink.command must name a program when sink.kind = \"command\"".to_string(),
            ));
        }
        Ok(())
    }
}

/// Decide which config file to read.
///
/// Priority order:
/// 1. Explicit path (command-line `--config`)
/// 2. `EBITS_CONFIG` environment variable
/// 3. User config directory (`~/.config/ebits/config.toml` on Linux)
/// 4. `/etc/ebits/config.toml` (Linux only)
///
/// Steps 1 and 2 are returned even if the file does not exist, so the caller
/// can warn about it; steps 3 and 4 only when the file exists.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let user_config = dirs::config_dir().map(|d| d.join("ebits").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/ebits/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = TomlConfig::parse("").unwrap();
        assert_eq!(config.audio.max_chunk_bytes, 5 * 1024 * 1024);
        assert!(!config.audio.recursive);
        assert_eq!(config.playback.continuity, ContinuityMode::Reset);
        assert_eq!(config.sink.kind, SinkKind::Command);
        assert!(!config.sink.command.is_empty());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_full_toml() {
        let config = TomlConfig::parse(
            r#"
            [audio]
            max_chunk_bytes = 4096
            recursive = true

            [playback]
            continuity = "carry"

            [sink]
            kind = "directory"
            output_dir = "/tmp/out"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.audio.max_chunk_bytes, 4096);
        assert!(config.audio.recursive);
        assert_eq!(config.playback.continuity, ContinuityMode::Carry);
        assert_eq!(config.sink.kind, SinkKind::Directory);
        assert_eq!(config.sink.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let result = TomlConfig::parse("[audio]\nmax_chunk_bytes = 0\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_command_rejected() {
        let result = TomlConfig::parse("[sink]\nkind = \"command\"\ncommand = []\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = TomlConfig::parse("[audio]\nchunk = 12\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("RESET".parse::<ContinuityMode>().unwrap(), ContinuityMode::Reset);
        assert_eq!("carry".parse::<ContinuityMode>().unwrap(), ContinuityMode::Carry);
        assert!("sometimes".parse::<ContinuityMode>().is_err());

        assert_eq!("dir".parse::<SinkKind>().unwrap(), SinkKind::Directory);
        assert_eq!("null".parse::<SinkKind>().unwrap(), SinkKind::Null);
        assert!("speaker".parse::<SinkKind>().is_err());
    }

    #[test]
    fn test_explicit_path_wins() {
        let explicit = PathBuf::from("/definitely/not/here.toml");
        assert_eq!(resolve_config_path(Some(&explicit)), Some(explicit));
    }
}
