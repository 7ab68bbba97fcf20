//! Error types for audio file I/O

use thiserror::Error;

/// File I/O errors
#[derive(Error, Debug)]
pub enum FileError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("unsupported bit depth: {0} (expected 16, 24, or 32)")]
    UnsupportedBitDepth(u32),

    #[error("sample rate mismatch: {path} is {actual} Hz, expected {expected} Hz")]
    SampleRateMismatch {
        path: String,
        expected: f64,
        actual: f64,
    },

    #[error("cannot seek to frame {requested}: source has {total} frames")]
    SeekOutOfRange { requested: u64, total: u64 },

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for file operations
pub type FileResult<T> = Result<T, FileError>;
