//! Error types for automation parsing

use rh_core::CoreError;
use std::error::Error;
use std::fmt;

/// Automation errors
///
/// Implemented by hand rather than via `thiserror` because the
/// `DuplicateKeyframe` variant has a `String` field named `source` (the
/// original time string from the document), which the derive would otherwise
/// treat as the error's `source()`.
#[derive(Debug)]
pub enum AutomationError {
    Json(serde_json::Error),

    InvalidDocument(String),

    Time(CoreError),

    OutOfRange(f64),

    DuplicateKeyframe { time: u64, source: String },

    TextValueUnsupported(String),

    InvalidValueType(String),
}

impl fmt::Display for AutomationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(e) => write!(f, "malformed automation document: {e}"),
            Self::InvalidDocument(msg) => write!(f, "invalid automation document: {msg}"),
            Self::Time(e) => fmt::Display::fmt(e, f),
            Self::OutOfRange(v) => write!(
                f,
                "normalized parameter value must be between 0 and 1, but is {v}"
            ),
            Self::DuplicateKeyframe { time, source } => write!(
                f,
                "duplicate keyframe time: {time} (from input string '{source}')"
            ),
            Self::TextValueUnsupported(name) => write!(
                f,
                "parameter '{name}' has a text value; text-to-value conversion is not supported"
            ),
            Self::InvalidValueType(name) => {
                write!(f, "invalid value for parameter '{name}': must be a number")
            }
        }
    }
}

impl Error for AutomationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            Self::Time(e) => e.source(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AutomationError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<CoreError> for AutomationError {
    fn from(e: CoreError) -> Self {
        Self::Time(e)
    }
}

/// Result type for automation operations
pub type AutomationResult<T> = Result<T, AutomationError>;
