//! Strict time-string parsing
//!
//! Keyframe times accept three forms:
//! - `<uint>` — an absolute sample index
//! - `<float>s` — seconds, converted with the session sample rate
//! - `<float>%` — a fraction of the total input length
//!
//! Parsing is strict: the whole trimmed string (after suffix removal) must
//! be consumed by the numeric conversion. There is no silent fallback.

use crate::{CoreError, CoreResult};

/// Parse a floating-point number, requiring the entire string to be consumed.
pub fn parse_f64_strict(s: &str) -> CoreResult<f64> {
    s.parse::<f64>()
        .map_err(|_| CoreError::InvalidNumber(s.to_string()))
}

/// Parse an unsigned integer, requiring the entire string to be consumed.
/// Negative values are rejected.
pub fn parse_u64_strict(s: &str) -> CoreResult<u64> {
    s.parse::<u64>()
        .map_err(|_| CoreError::InvalidNumber(s.to_string()))
}

/// Convert seconds to a whole frame count at the given sample rate.
pub fn seconds_to_frames(seconds: f64, sample_rate: f64) -> u64 {
    (seconds * sample_rate).round() as u64
}

/// Resolve a time string to an absolute frame index.
///
/// `sample_rate` resolves the `s` suffix, `total_frames` the `%` suffix.
/// Whitespace around the value and between value and suffix is trimmed.
pub fn parse_frame_time(time_str: &str, sample_rate: f64, total_frames: u64) -> CoreResult<u64> {
    let trimmed = time_str.trim();

    if let Some(number) = trimmed.strip_suffix('s') {
        let seconds = parse_f64_strict(number.trim_end())?;
        return checked_frames(seconds * sample_rate, trimmed);
    }

    if let Some(number) = trimmed.strip_suffix('%') {
        let pct = parse_f64_strict(number.trim_end())?;
        return checked_frames((pct / 100.0) * total_frames as f64, trimmed);
    }

    parse_u64_strict(trimmed)
}

/// Round a frame count to an index, rejecting negative or non-finite results.
fn checked_frames(frames: f64, source: &str) -> CoreResult<u64> {
    if !frames.is_finite() || frames < 0.0 {
        return Err(CoreError::InvalidNumber(source.to_string()));
    }
    Ok(frames.round() as u64)
}
