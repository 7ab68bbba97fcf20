//! rh-file: audio file I/O
//!
//! WAV reading and writing via hound, plus the multi-file synchronized
//! reader that merges N input sources into one interleaved stream.

mod error;
mod reader;
mod writer;

pub use error::*;
pub use reader::*;
pub use writer::*;
