//! Error types for the render orchestrator

use rh_automation::AutomationError;
use rh_file::FileError;
use rh_plugin::PluginError;
use thiserror::Error;

/// Render errors
///
/// Only `ShortWrite` aborts a render that has already started; a per-block
/// plugin failure is recovered and logged. Everything else surfaces during
/// configuration, before any output I/O.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("block size must be between {min} and {max}, got {got}")]
    InvalidBlockSize { got: usize, min: usize, max: usize },

    #[error("duration must be positive, got {0}")]
    InvalidDuration(f64),

    #[error("output file already exists: {0} (use overwrite to replace)")]
    OutputExists(String),

    #[error("input file does not exist: {0}")]
    InputNotFound(String),

    #[error("short write at frame {frame}: expected {expected} frames, wrote {written}")]
    ShortWrite {
        frame: u64,
        expected: usize,
        written: usize,
    },

    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    Automation(#[from] AutomationError),

    #[error("plugin error: {0}")]
    Plugin(#[from] PluginError),
}

/// Result type for render operations
pub type RenderResult<T> = Result<T, RenderError>;
