//! rh-automation: time-keyed parameter automation
//!
//! Parses a declarative JSON document into per-parameter keyframe schedules
//! and evaluates them at arbitrary sample indices with linear interpolation.

mod error;
mod schedule;

pub use error::*;
pub use schedule::*;
