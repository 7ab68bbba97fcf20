//! Error types for plugin hosting

use thiserror::Error;

/// Plugin errors
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("no event input bus {0}")]
    InvalidEventBus(usize),

    #[error("plugin is not processing")]
    NotProcessing,

    #[error("processing failed: {0}")]
    ProcessingFailed(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

/// Result type for plugin operations
pub type PluginResult<T> = Result<T, PluginError>;
