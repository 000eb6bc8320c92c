//! # EBITS Common Library
//!
//! Shared code for the EBITS script player including:
//! - Error types
//! - TOML configuration loading and config file resolution
//! - Event types (EbitsEvent enum) and the broadcast EventBus
//! - Human-readable time formatting for log and status output

pub mod config;
pub mod error;
pub mod events;
pub mod human_time;

pub use error::{Error, Result};
pub use events::{EbitsEvent, EventBus, PlaybackStatus, StateSnapshot};
