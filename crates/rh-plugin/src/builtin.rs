//! Built-in plugin instances
//!
//! Small processors implementing the standard `PluginInstance` interface so
//! the host can render without an external plugin ABI: a gain utility, a
//! passthrough, and a note-driven tone generator for instrument mode.

use rh_core::Sample;

use crate::{
    BusDirection, PluginError, PluginEvent, PluginInstance, PluginResult, TransportContext,
};

/// Look up a built-in instance by name
pub fn create_builtin(name: &str) -> Option<Box<dyn PluginInstance>> {
    match name {
        "gain" => Some(Box::new(GainPlugin::new())),
        "passthrough" => Some(Box::new(PassthroughPlugin::new())),
        "tone" => Some(Box::new(ToneGenerator::new())),
        _ => None,
    }
}

/// Names accepted by [`create_builtin`]
pub fn builtin_names() -> &'static [&'static str] {
    &["gain", "passthrough", "tone"]
}

/// Planar channel buffers shared by the built-in instances
struct ChannelBuffers {
    inputs: Vec<Vec<Sample>>,
    outputs: Vec<Vec<Sample>>,
}

impl ChannelBuffers {
    fn new(input_channels: usize, output_channels: usize) -> Self {
        Self {
            inputs: vec![Vec::new(); input_channels],
            outputs: vec![Vec::new(); output_channels],
        }
    }

    fn prepare(&mut self, max_block_frames: usize) {
        for ch in self.inputs.iter_mut().chain(self.outputs.iter_mut()) {
            ch.clear();
            ch.resize(max_block_frames, 0.0);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GAIN
// ═══════════════════════════════════════════════════════════════════════════════

/// Stereo gain utility with one normalized `gain` parameter
pub struct GainPlugin {
    buffers: ChannelBuffers,
    transport: TransportContext,
    gain: Sample,
    processing: bool,
}

impl GainPlugin {
    pub fn new() -> Self {
        Self {
            buffers: ChannelBuffers::new(2, 2),
            transport: TransportContext::default(),
            gain: 1.0,
            processing: false,
        }
    }
}

impl Default for GainPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginInstance for GainPlugin {
    fn name(&self) -> &str {
        "gain"
    }

    fn prepare(&mut self, _sample_rate: f64, max_block_frames: usize) -> PluginResult<()> {
        self.buffers.prepare(max_block_frames);
        Ok(())
    }

    fn set_parameter(&mut self, name: &str, value: Sample) -> PluginResult<()> {
        match name {
            "gain" => {
                self.gain = value.clamp(0.0, 1.0);
                Ok(())
            }
            other => Err(PluginError::UnknownParameter(other.to_string())),
        }
    }

    fn advance_transport(&mut self, frames: u64) {
        self.transport.advance(frames);
    }

    fn inject_input_event(&mut self, _bus: usize, _event: PluginEvent) -> PluginResult<()> {
        Err(PluginError::Unsupported("event input".to_string()))
    }

    fn start_processing(&mut self) -> PluginResult<()> {
        self.processing = true;
        Ok(())
    }

    fn stop_processing(&mut self) -> PluginResult<()> {
        self.processing = false;
        Ok(())
    }

    fn process(&mut self, frames: usize) -> PluginResult<()> {
        if !self.processing {
            return Err(PluginError::NotProcessing);
        }
        for (input, output) in self.buffers.inputs.iter().zip(self.buffers.outputs.iter_mut()) {
            for i in 0..frames.min(input.len()) {
                output[i] = input[i] * self.gain;
            }
        }
        Ok(())
    }

    fn channel_count(&self, _direction: BusDirection) -> usize {
        2
    }

    fn input_channel_mut(&mut self, bus: usize, channel: usize) -> Option<&mut [Sample]> {
        if bus != 0 {
            return None;
        }
        self.buffers.inputs.get_mut(channel).map(|c| c.as_mut_slice())
    }

    fn output_channel(&self, bus: usize, channel: usize) -> Option<&[Sample]> {
        if bus != 0 {
            return None;
        }
        self.buffers.outputs.get(channel).map(|c| c.as_slice())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PASSTHROUGH
// ═══════════════════════════════════════════════════════════════════════════════

/// Null processor: output is a copy of the input
pub struct PassthroughPlugin {
    buffers: ChannelBuffers,
    transport: TransportContext,
    processing: bool,
}

impl PassthroughPlugin {
    pub fn new() -> Self {
        Self {
            buffers: ChannelBuffers::new(2, 2),
            transport: TransportContext::default(),
            processing: false,
        }
    }
}

impl Default for PassthroughPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginInstance for PassthroughPlugin {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn prepare(&mut self, _sample_rate: f64, max_block_frames: usize) -> PluginResult<()> {
        self.buffers.prepare(max_block_frames);
        Ok(())
    }

    fn set_parameter(&mut self, name: &str, _value: Sample) -> PluginResult<()> {
        Err(PluginError::UnknownParameter(name.to_string()))
    }

    fn advance_transport(&mut self, frames: u64) {
        self.transport.advance(frames);
    }

    fn inject_input_event(&mut self, _bus: usize, _event: PluginEvent) -> PluginResult<()> {
        Err(PluginError::Unsupported("event input".to_string()))
    }

    fn start_processing(&mut self) -> PluginResult<()> {
        self.processing = true;
        Ok(())
    }

    fn stop_processing(&mut self) -> PluginResult<()> {
        self.processing = false;
        Ok(())
    }

    fn process(&mut self, frames: usize) -> PluginResult<()> {
        if !self.processing {
            return Err(PluginError::NotProcessing);
        }
        for (input, output) in self.buffers.inputs.iter().zip(self.buffers.outputs.iter_mut()) {
            let n = frames.min(input.len());
            output[..n].copy_from_slice(&input[..n]);
        }
        Ok(())
    }

    fn channel_count(&self, _direction: BusDirection) -> usize {
        2
    }

    fn input_channel_mut(&mut self, bus: usize, channel: usize) -> Option<&mut [Sample]> {
        if bus != 0 {
            return None;
        }
        self.buffers.inputs.get_mut(channel).map(|c| c.as_mut_slice())
    }

    fn output_channel(&self, bus: usize, channel: usize) -> Option<&[Sample]> {
        if bus != 0 {
            return None;
        }
        self.buffers.outputs.get(channel).map(|c| c.as_slice())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TONE GENERATOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Instrument-style sine generator driven by injected note events
///
/// Has no audio input; renders a sine wave while a note is held, with a
/// normalized `level` parameter scaling the output.
pub struct ToneGenerator {
    buffers: ChannelBuffers,
    transport: TransportContext,
    sample_rate: f64,
    level: Sample,
    processing: bool,
    pending: Vec<PluginEvent>,
    /// (frequency Hz, velocity, frames remaining)
    active_note: Option<(f64, f32, u64)>,
    phase: f64,
}

impl ToneGenerator {
    pub fn new() -> Self {
        Self {
            buffers: ChannelBuffers::new(0, 2),
            transport: TransportContext::default(),
            sample_rate: 0.0,
            level: 0.5,
            processing: false,
            pending: Vec::new(),
            active_note: None,
            phase: 0.0,
        }
    }

    fn pitch_to_hz(pitch: u8) -> f64 {
        440.0 * 2f64.powf((pitch as f64 - 69.0) / 12.0)
    }

    fn apply_pending_events(&mut self) {
        for event in self.pending.drain(..) {
            match event {
                PluginEvent::NoteOn {
                    pitch,
                    velocity,
                    length,
                    ..
                } => {
                    let hz = Self::pitch_to_hz(pitch);
                    log::debug!("tone: note on, pitch {pitch} ({hz:.2} Hz), {length} frames");
                    self.active_note = Some((hz, velocity, length));
                    self.phase = 0.0;
                }
                PluginEvent::NoteOff { pitch, .. } => {
                    if let Some((hz, _, _)) = self.active_note {
                        if (hz - Self::pitch_to_hz(pitch)).abs() < 1e-9 {
                            self.active_note = None;
                        }
                    }
                }
            }
        }
    }
}

impl Default for ToneGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginInstance for ToneGenerator {
    fn name(&self) -> &str {
        "tone"
    }

    fn prepare(&mut self, sample_rate: f64, max_block_frames: usize) -> PluginResult<()> {
        self.sample_rate = sample_rate;
        self.buffers.prepare(max_block_frames);
        Ok(())
    }

    fn set_parameter(&mut self, name: &str, value: Sample) -> PluginResult<()> {
        match name {
            "level" => {
                self.level = value.clamp(0.0, 1.0);
                Ok(())
            }
            other => Err(PluginError::UnknownParameter(other.to_string())),
        }
    }

    fn advance_transport(&mut self, frames: u64) {
        self.transport.advance(frames);
    }

    fn inject_input_event(&mut self, bus: usize, event: PluginEvent) -> PluginResult<()> {
        if bus != 0 {
            return Err(PluginError::InvalidEventBus(bus));
        }
        self.pending.push(event);
        Ok(())
    }

    fn start_processing(&mut self) -> PluginResult<()> {
        self.processing = true;
        Ok(())
    }

    fn stop_processing(&mut self) -> PluginResult<()> {
        self.processing = false;
        self.active_note = None;
        Ok(())
    }

    fn process(&mut self, frames: usize) -> PluginResult<()> {
        if !self.processing {
            return Err(PluginError::NotProcessing);
        }
        self.apply_pending_events();

        for i in 0..frames {
            let sample = match self.active_note.as_mut() {
                Some((hz, velocity, remaining)) if *remaining > 0 => {
                    let value = (self.phase * std::f64::consts::TAU).sin() as Sample
                        * *velocity
                        * self.level;
                    self.phase += *hz / self.sample_rate;
                    if self.phase >= 1.0 {
                        self.phase -= 1.0;
                    }
                    *remaining -= 1;
                    value
                }
                _ => 0.0,
            };

            for output in &mut self.buffers.outputs {
                if i < output.len() {
                    output[i] = sample;
                }
            }
        }
        Ok(())
    }

    fn channel_count(&self, direction: BusDirection) -> usize {
        match direction {
            BusDirection::Input => 0,
            BusDirection::Output => 2,
        }
    }

    fn input_channel_mut(&mut self, _bus: usize, _channel: usize) -> Option<&mut [Sample]> {
        None
    }

    fn output_channel(&self, bus: usize, channel: usize) -> Option<&[Sample]> {
        if bus != 0 {
            return None;
        }
        self.buffers.outputs.get(channel).map(|c| c.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_builtin() {
        assert!(create_builtin("gain").is_some());
        assert!(create_builtin("passthrough").is_some());
        assert!(create_builtin("tone").is_some());
        assert!(create_builtin("vintage-tape-echo").is_none());
    }

    #[test]
    fn test_gain_scales_input() {
        let mut plugin = GainPlugin::new();
        plugin.prepare(44100.0, 8).unwrap();
        plugin.set_parameter("gain", 0.5).unwrap();
        plugin.start_processing().unwrap();

        plugin.input_channel_mut(0, 0).unwrap().fill(0.8);
        plugin.input_channel_mut(0, 1).unwrap().fill(-0.4);
        plugin.process(8).unwrap();

        assert!((plugin.output_channel(0, 0).unwrap()[0] - 0.4).abs() < 1e-6);
        assert!((plugin.output_channel(0, 1).unwrap()[7] + 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let mut plugin = GainPlugin::new();
        let err = plugin.set_parameter("feedback", 0.5).unwrap_err();
        assert!(matches!(err, PluginError::UnknownParameter(p) if p == "feedback"));
    }

    #[test]
    fn test_effects_reject_event_injection() {
        // Effects have no event input at all, on any bus
        let mut gain = GainPlugin::new();
        assert!(matches!(
            gain.inject_input_event(0, PluginEvent::note_off(60, 0, 0)),
            Err(PluginError::Unsupported(_))
        ));
        let mut passthrough = PassthroughPlugin::new();
        assert!(matches!(
            passthrough.inject_input_event(0, PluginEvent::note_off(60, 0, 0)),
            Err(PluginError::Unsupported(_))
        ));
    }

    #[test]
    fn test_process_requires_start() {
        let mut plugin = GainPlugin::new();
        plugin.prepare(44100.0, 8).unwrap();
        assert!(matches!(plugin.process(8), Err(PluginError::NotProcessing)));
    }

    #[test]
    fn test_tone_generator_renders_while_note_held() {
        let mut plugin = ToneGenerator::new();
        plugin.prepare(44100.0, 64).unwrap();
        plugin.start_processing().unwrap();

        // Silence without a note
        plugin.process(64).unwrap();
        assert!(plugin.output_channel(0, 0).unwrap().iter().all(|&s| s == 0.0));

        // Note held for 32 frames: audio then silence
        plugin
            .inject_input_event(0, PluginEvent::NoteOn {
                channel: 0,
                pitch: 69,
                velocity: 1.0,
                length: 32,
                sample_offset: 0,
            })
            .unwrap();
        plugin.process(64).unwrap();
        let out = plugin.output_channel(0, 0).unwrap();
        assert!(out[..32].iter().any(|&s| s != 0.0));
        assert!(out[32..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_tone_generator_has_no_input_channels() {
        let mut plugin = ToneGenerator::new();
        assert_eq!(plugin.channel_count(BusDirection::Input), 0);
        assert!(plugin.input_channel_mut(0, 0).is_none());
        assert!(matches!(
            plugin.inject_input_event(1, PluginEvent::note_off(60, 0, 0)),
            Err(PluginError::InvalidEventBus(1))
        ));
    }
}
