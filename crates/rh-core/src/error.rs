//! Error types for rh-core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid number: '{0}'")]
    InvalidNumber(String),
}

/// Result type alias
pub type CoreResult<T> = Result<T, CoreError>;
