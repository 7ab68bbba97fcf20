//! rh-core: Shared types, defaults, and time parsing for RenderHost
//!
//! This crate provides the foundational pieces used across all RenderHost
//! crates: the sample type, the strict numeric/time-string grammar, and the
//! host-wide default constants.

mod error;
mod time;

pub mod defaults;

pub use error::*;
pub use time::*;

/// Audio sample type used throughout the host (the plugin ABI is 32-bit float)
pub type Sample = f32;
