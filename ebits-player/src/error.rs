//! Error types for ebits-player
//!
//! One variant per failure category so callers can tell a script problem
//! (line-tagged, fail-fast) from an audio problem (aborts before replay) from a
//! sink problem (the only recoverable one).

use crate::audio::AudioFormat;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for ebits-player
#[derive(Error, Debug)]
pub enum Error {
    /// Line syntax the tokenizer cannot accept
    #[error("Malformed instruction at line {line}: {reason}")]
    MalformedInstruction { line: usize, reason: String },

    /// 4-symbol code that is not in the instruction table
    #[error("Invalid opcode '{code}' at line {line}")]
    UnknownOpcode { line: usize, code: String },

    /// Operand supplied to a voidable opcode, or missing from a non-voidable one
    #[error("{mnemonic} at line {line}: {detail}")]
    OperandArity {
        line: usize,
        mnemonic: &'static str,
        detail: &'static str,
    },

    /// Operand present but not in the shape the opcode accepts
    #[error("Malformed operand for {mnemonic} at line {line}: {reason}")]
    OperandFormat {
        line: usize,
        mnemonic: &'static str,
        reason: String,
    },

    /// No earlier instruction satisfies the opcode's dependency rule
    #[error("Unmet dependency for {mnemonic} at line {line}: {reason}")]
    Dependency {
        line: usize,
        mnemonic: &'static str,
        reason: String,
    },

    /// Buffer is not a RIFF/WAVE container
    #[error("Invalid WAV container: {0}")]
    InvalidContainer(String),

    /// Required chunk absent by end of buffer
    #[error("WAV container has no '{0}' chunk")]
    MissingChunk(&'static str),

    /// Input files disagree on channel count, sample rate or bit depth
    #[error("{}: format {actual} does not match {expected} of the first file", .path.display())]
    FormatMismatch {
        path: PathBuf,
        expected: AudioFormat,
        actual: AudioFormat,
    },

    /// Directory input contains no `.wav` files
    #[error("No .wav files found in {}", .0.display())]
    NoAudioFiles(PathBuf),

    /// Input path does not exist or cannot be read
    #[error("Path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    /// PCM too long for the 32-bit size fields of a WAV header
    #[error("PCM buffer of {0} bytes does not fit in a WAV container")]
    PcmTooLarge(usize),

    /// DSP primitive asked to process a bit depth other than 8 or 16
    #[error("Unsupported sample width: {0} bits (expected 8 or 16)")]
    UnsupportedSampleWidth(u16),

    /// Playback sink reported failure
    #[error("Playback sink failure: {0}")]
    Sink(String),

    /// Error attributed to a specific audio file
    #[error("{}: {source}", .path.display())]
    AudioFile {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Attach a file path to an audio error
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        Error::AudioFile {
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// Script line the error refers to, for tokenizer/validator errors
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::MalformedInstruction { line, .. }
            | Error::UnknownOpcode { line, .. }
            | Error::OperandArity { line, .. }
            | Error::OperandFormat { line, .. }
            | Error::Dependency { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// Only sink failures let the run continue with the next chunk
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Sink(_))
    }

    /// The error with any file-path wrapper removed
    pub fn root(&self) -> &Error {
        match self {
            Error::AudioFile { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<ebits_common::Error> for Error {
    fn from(err: ebits_common::Error) -> Self {
        match err {
            ebits_common::Error::Io(e) => Error::Io(e),
            other => Error::Config(other.to_string()),
        }
    }
}

/// Convenience Result type using ebits-player Error
pub type Result<T> = std::result::Result<T, Error>;
