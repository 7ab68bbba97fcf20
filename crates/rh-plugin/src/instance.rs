//! The plugin capability trait
//!
//! Mirrors the operations the render loop needs from a hosted plugin:
//! normalized parameter updates, transport advancement, event injection,
//! lifecycle, per-block processing, and planar channel-buffer access.

use rh_core::Sample;

use crate::{PluginEvent, PluginResult};

/// Bus direction for channel-buffer access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusDirection {
    Input,
    Output,
}

/// Musical timing state plugins may consult during processing
#[derive(Debug, Clone, Copy)]
pub struct TransportContext {
    /// Absolute sample position of the current block's first frame
    pub sample_position: u64,
    pub tempo: f64,
    pub playing: bool,
}

impl Default for TransportContext {
    fn default() -> Self {
        Self {
            sample_position: 0,
            tempo: 120.0,
            playing: false,
        }
    }
}

impl TransportContext {
    /// Advance by one processed block
    pub fn advance(&mut self, frames: u64) {
        self.sample_position += frames;
        self.playing = true;
    }
}

/// An already-instantiated audio plugin driven by the orchestrator
///
/// Instances are not reentrant: callers must not invoke `process` from two
/// threads at once. The render crate guards invocation with an atomic gate.
pub trait PluginInstance {
    fn name(&self) -> &str;

    /// Allocate channel buffers for the session's sample rate and block size
    fn prepare(&mut self, sample_rate: f64, max_block_frames: usize) -> PluginResult<()>;

    /// Set a normalized parameter value in [0, 1] by name
    fn set_parameter(&mut self, name: &str, value: Sample) -> PluginResult<()>;

    /// Advance the transport/timing context by one block
    fn advance_transport(&mut self, frames: u64);

    /// Queue an event on the given input event bus
    fn inject_input_event(&mut self, bus: usize, event: PluginEvent) -> PluginResult<()>;

    fn start_processing(&mut self) -> PluginResult<()>;

    fn stop_processing(&mut self) -> PluginResult<()>;

    /// Process `frames` samples from the input buffers into the output
    /// buffers. A failure here only invalidates this block.
    fn process(&mut self, frames: usize) -> PluginResult<()>;

    /// Number of channels on the main bus in the given direction
    fn channel_count(&self, direction: BusDirection) -> usize;

    /// Mutable view of an input channel buffer (None if absent)
    fn input_channel_mut(&mut self, bus: usize, channel: usize) -> Option<&mut [Sample]>;

    /// View of an output channel buffer (None if absent)
    fn output_channel(&self, bus: usize, channel: usize) -> Option<&[Sample]>;
}
