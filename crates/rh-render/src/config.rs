//! Render session configuration

use std::path::PathBuf;

use rh_core::defaults;

use crate::{RenderError, RenderResult};

/// Configuration for one offline render
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Input audio files; empty means instrument mode
    pub inputs: Vec<PathBuf>,
    /// Output audio file
    pub output: PathBuf,
    /// Explicit sample rate; falls back to the input rate, then the default
    pub sample_rate: Option<f64>,
    /// Processing block size in frames
    pub block_size: usize,
    /// Output bit depth (16, 24, or 32)
    pub bit_depth: u32,
    /// Render duration in seconds for instrument mode
    pub duration: Option<f64>,
    /// One-time parameter settings applied before the first block
    pub settings: Vec<(String, String)>,
    /// JSON automation document text
    pub automation_json: Option<String>,
    /// Replace an existing output file
    pub overwrite: bool,
    /// Frames between automation updates; `None` evaluates once per block.
    /// Finer resolution splits each block into processing segments, which
    /// changes render output for existing automation documents.
    pub automation_interval: Option<usize>,
}

impl RenderConfig {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.into(),
            sample_rate: None,
            block_size: defaults::BLOCK_SIZE,
            bit_depth: defaults::BIT_DEPTH,
            duration: None,
            settings: Vec::new(),
            automation_json: None,
            overwrite: false,
            automation_interval: None,
        }
    }

    pub fn with_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(path.into());
        self
    }

    pub fn with_sample_rate(mut self, rate: f64) -> Self {
        self.sample_rate = Some(rate);
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_bit_depth(mut self, bit_depth: u32) -> Self {
        self.bit_depth = bit_depth;
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    pub fn with_setting(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.push((name.into(), value.into()));
        self
    }

    pub fn with_automation_json(mut self, json: impl Into<String>) -> Self {
        self.automation_json = Some(json.into());
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_automation_interval(mut self, frames: usize) -> Self {
        self.automation_interval = Some(frames);
        self
    }

    /// Validate numeric configuration. Fails before any I/O is attempted.
    pub fn validate(&self) -> RenderResult<()> {
        if self.block_size < defaults::MIN_BLOCK_SIZE || self.block_size > defaults::MAX_BLOCK_SIZE
        {
            return Err(RenderError::InvalidBlockSize {
                got: self.block_size,
                min: defaults::MIN_BLOCK_SIZE,
                max: defaults::MAX_BLOCK_SIZE,
            });
        }

        if !matches!(self.bit_depth, 16 | 24 | 32) {
            return Err(rh_file::FileError::UnsupportedBitDepth(self.bit_depth).into());
        }

        if let Some(duration) = self.duration {
            if duration <= 0.0 || !duration.is_finite() {
                return Err(RenderError::InvalidDuration(duration));
            }
        }

        if let Some(interval) = self.automation_interval {
            if interval == 0 {
                return Err(RenderError::InvalidBlockSize {
                    got: 0,
                    min: 1,
                    max: self.block_size,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::new("out.wav");
        assert_eq!(config.block_size, 512);
        assert_eq!(config.bit_depth, 32);
        assert!(config.inputs.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_block_size_bounds() {
        assert!(RenderConfig::new("out.wav").with_block_size(31).validate().is_err());
        assert!(RenderConfig::new("out.wav").with_block_size(32).validate().is_ok());
        assert!(RenderConfig::new("out.wav").with_block_size(8192).validate().is_ok());
        assert!(RenderConfig::new("out.wav").with_block_size(8193).validate().is_err());
    }

    #[test]
    fn test_bit_depth_validation() {
        for depth in [16, 24, 32] {
            assert!(RenderConfig::new("out.wav").with_bit_depth(depth).validate().is_ok());
        }
        assert!(RenderConfig::new("out.wav").with_bit_depth(8).validate().is_err());
    }

    #[test]
    fn test_duration_must_be_positive() {
        assert!(RenderConfig::new("out.wav").with_duration(0.0).validate().is_err());
        assert!(RenderConfig::new("out.wav").with_duration(-1.0).validate().is_err());
        assert!(RenderConfig::new("out.wav").with_duration(2.5).validate().is_ok());
    }
}
