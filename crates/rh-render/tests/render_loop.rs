//! End-to-end tests for the block-rendering loop
//!
//! A memory sink and a scriptable plugin stand in for the file writer and a
//! real hosted plugin, so failure paths (per-block processing errors, short
//! writes) can be exercised deterministically. Two tests at the bottom run
//! the whole pipeline against real WAV files in the temp directory.

use std::path::PathBuf;

use rh_core::Sample;
use rh_file::{AudioFileReader, AudioFileWriter, AudioSink, FileResult};
use rh_plugin::{
    create_builtin, BusDirection, PluginError, PluginEvent, PluginInstance, PluginResult,
};
use rh_render::{RenderConfig, RenderError, RenderState, Renderer};

// ═══════════════════════════════════════════════════════════════════════════════
// TEST DOUBLES
// ═══════════════════════════════════════════════════════════════════════════════

/// Sink that keeps every sample in memory and can fake a short write
struct MemorySink {
    samples: Vec<Sample>,
    blocks_written: usize,
    short_write_on_block: Option<usize>,
    finalized: bool,
}

impl MemorySink {
    fn new() -> Self {
        Self {
            samples: Vec::new(),
            blocks_written: 0,
            short_write_on_block: None,
            finalized: false,
        }
    }

    fn failing_on_block(block: usize) -> Self {
        Self {
            short_write_on_block: Some(block),
            ..Self::new()
        }
    }
}

impl AudioSink for MemorySink {
    fn write(&mut self, buffer: &[Sample], frames: usize) -> usize {
        let block = self.blocks_written;
        self.blocks_written += 1;
        if self.short_write_on_block == Some(block) {
            return frames / 2;
        }
        self.samples.extend_from_slice(buffer);
        frames
    }

    fn finalize(&mut self) -> FileResult<()> {
        self.finalized = true;
        Ok(())
    }
}

/// Scriptable instrument-style plugin: no audio input, constant output,
/// one normalized `amp` parameter, and an optional per-block failure.
struct ScriptedPlugin {
    outputs: Vec<Vec<Sample>>,
    amp: Sample,
    processing: bool,
    blocks_processed: u64,
    fail_on_block: Option<u64>,
    injected: Vec<PluginEvent>,
}

impl ScriptedPlugin {
    fn new() -> Self {
        Self {
            outputs: vec![Vec::new(); 2],
            amp: 1.0,
            processing: false,
            blocks_processed: 0,
            fail_on_block: None,
            injected: Vec::new(),
        }
    }

    fn failing_on_block(block: u64) -> Self {
        Self {
            fail_on_block: Some(block),
            ..Self::new()
        }
    }
}

impl PluginInstance for ScriptedPlugin {
    fn name(&self) -> &str {
        "scripted"
    }

    fn prepare(&mut self, _sample_rate: f64, max_block_frames: usize) -> PluginResult<()> {
        for ch in &mut self.outputs {
            ch.clear();
            ch.resize(max_block_frames, 0.0);
        }
        Ok(())
    }

    fn set_parameter(&mut self, name: &str, value: Sample) -> PluginResult<()> {
        if name != "amp" {
            return Err(PluginError::UnknownParameter(name.to_string()));
        }
        self.amp = value;
        Ok(())
    }

    fn advance_transport(&mut self, _frames: u64) {}

    fn inject_input_event(&mut self, _bus: usize, event: PluginEvent) -> PluginResult<()> {
        self.injected.push(event);
        Ok(())
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
        let block = self.blocks_processed;
        self.blocks_processed += 1;
        if self.fail_on_block == Some(block) {
            // Leave silence behind, like a plugin that bailed out early
            for ch in &mut self.outputs {
                ch.fill(0.0);
            }
            return Err(PluginError::ProcessingFailed(format!(
                "scripted failure on block {block}"
            )));
        }
        for ch in &mut self.outputs {
            for sample in ch.iter_mut().take(frames) {
                *sample = self.amp;
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
        self.outputs.get(channel).map(|c| c.as_slice())
    }
}

fn temp_wav(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("rh-render-{}-{}.wav", std::process::id(), name))
}

/// Route loop logging through the test harness (RUST_LOG selects the level)
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOOP BEHAVIOR
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_full_render_frame_and_block_accounting() {
    init_logging();
    // 44100 frames at block 512: 86 full blocks plus a 68-frame tail
    let config = RenderConfig::new("unused.wav")
        .with_sample_rate(44100.0)
        .with_duration(1.0);
    let mut renderer = Renderer::new(config);
    let mut plugin = ScriptedPlugin::new();
    let mut sink = MemorySink::new();

    let report = renderer.run_with_sink(&mut plugin, &mut sink).unwrap();

    assert_eq!(report.state, RenderState::Finished);
    assert_eq!(report.frames_processed, 44100);
    assert_eq!(report.blocks_processed, 87);
    assert_eq!(renderer.state(), RenderState::Finished);
    assert!((renderer.progress() - 1.0).abs() < 1e-12);
    // Stereo interleaved output, one sample pair per frame
    assert_eq!(sink.samples.len(), 44100 * 2);
    assert!(sink.finalized);
    assert!(!plugin.processing);
}

#[test]
fn test_plugin_failure_skips_block_but_render_finishes() {
    init_logging();
    let config = RenderConfig::new("unused.wav")
        .with_sample_rate(44100.0)
        .with_duration(0.1);
    let mut renderer = Renderer::new(config);
    let mut plugin = ScriptedPlugin::failing_on_block(2);
    let mut sink = MemorySink::new();

    let report = renderer.run_with_sink(&mut plugin, &mut sink).unwrap();

    // 4410 frames: 8 full blocks + tail, all written despite the failure
    assert_eq!(report.frames_processed, 4410);
    assert_eq!(report.state, RenderState::Finished);
    assert_eq!(sink.samples.len(), 4410 * 2);

    // The failed block stays silent; its neighbors carry the plugin output
    let block = 512 * 2;
    assert!(sink.samples[block..2 * block].iter().all(|&s| s == 1.0));
    assert!(sink.samples[2 * block..3 * block].iter().all(|&s| s == 0.0));
    assert!(sink.samples[3 * block..4 * block].iter().all(|&s| s == 1.0));
}

#[test]
fn test_short_write_aborts_render() {
    init_logging();
    let config = RenderConfig::new("unused.wav")
        .with_sample_rate(44100.0)
        .with_duration(1.0);
    let mut renderer = Renderer::new(config);
    let mut plugin = ScriptedPlugin::new();
    let mut sink = MemorySink::failing_on_block(1);

    let err = renderer.run_with_sink(&mut plugin, &mut sink).unwrap_err();

    match err {
        RenderError::ShortWrite {
            frame,
            expected,
            written,
        } => {
            assert_eq!(frame, 512);
            assert_eq!(expected, 512);
            assert_eq!(written, 256);
        }
        other => panic!("expected ShortWrite, got {other}"),
    }
    assert_eq!(renderer.state(), RenderState::Failed);
    // Block 2 never started
    assert_eq!(sink.blocks_written, 2);
    // The plugin was still stopped and the sink still finalized
    assert!(!plugin.processing);
    assert!(sink.finalized);
}

#[test]
fn test_instrument_mode_injects_one_note_on() {
    init_logging();
    let config = RenderConfig::new("unused.wav")
        .with_sample_rate(44100.0)
        .with_duration(0.05);
    let mut renderer = Renderer::new(config);
    let mut plugin = ScriptedPlugin::new();
    let mut sink = MemorySink::new();

    renderer.run_with_sink(&mut plugin, &mut sink).unwrap();

    assert_eq!(plugin.injected.len(), 1);
    match plugin.injected[0] {
        PluginEvent::NoteOn {
            pitch,
            velocity,
            length,
            sample_offset,
            ..
        } => {
            assert_eq!(pitch, 60);
            assert!((velocity - 0.8).abs() < 1e-6);
            // 8 seconds at 44100 Hz
            assert_eq!(length, 352_800);
            assert_eq!(sample_offset, 0);
        }
        other => panic!("expected NoteOn, got {other:?}"),
    }
}

#[test]
fn test_one_time_settings_applied_before_first_block() {
    init_logging();
    let config = RenderConfig::new("unused.wav")
        .with_sample_rate(44100.0)
        .with_duration(0.05)
        .with_setting("amp", "0.25")
        .with_setting("amp", "not-a-number") // skipped, keeps 0.25
        .with_setting("unknown", "1.0"); // rejected by the plugin, skipped
    let mut renderer = Renderer::new(config);
    let mut plugin = ScriptedPlugin::new();
    let mut sink = MemorySink::new();

    renderer.run_with_sink(&mut plugin, &mut sink).unwrap();

    assert!(sink.samples.iter().all(|&s| (s - 0.25).abs() < 1e-6));
}

#[test]
fn test_automation_sampled_at_block_starts() {
    init_logging();
    // Linear ramp on `amp` over the first 44032 frames (86 blocks of 512)
    let automation = r#"{"amp": {"0": 0.0, "44032": 1.0}}"#;
    let config = RenderConfig::new("unused.wav")
        .with_sample_rate(44100.0)
        .with_duration(1.0)
        .with_automation_json(automation);
    let mut renderer = Renderer::new(config);
    let mut plugin = ScriptedPlugin::new();
    let mut sink = MemorySink::new();

    renderer.run_with_sink(&mut plugin, &mut sink).unwrap();

    // Every sample within a block carries the value at the block's first frame
    for block in [0u64, 1, 10, 43, 86] {
        let expected = (block * 512) as f32 / 44032.0;
        let sample = sink.samples[(block * 512 * 2) as usize];
        assert!(
            (sample - expected.min(1.0)).abs() < 1e-6,
            "block {block}: expected {expected}, got {sample}"
        );
    }
    // Within block 1 the value holds until the next block boundary
    let block1 = &sink.samples[512 * 2..1024 * 2];
    assert!(block1.iter().all(|&s| (s - 512.0 / 44032.0).abs() < 1e-6));
}

#[test]
fn test_finer_automation_interval_updates_inside_a_block() {
    init_logging();
    let automation = r#"{"amp": {"0": 0.0, "512": 1.0}}"#;
    let config = RenderConfig::new("unused.wav")
        .with_sample_rate(44100.0)
        .with_duration(0.05)
        .with_automation_interval(128)
        .with_automation_json(automation);
    let mut renderer = Renderer::new(config);
    let mut plugin = ScriptedPlugin::new();
    let mut sink = MemorySink::new();

    renderer.run_with_sink(&mut plugin, &mut sink).unwrap();

    // Four segments inside block 0, each holding its own ramp value
    for segment in 0u64..4 {
        let expected = (segment * 128) as f32 / 512.0;
        let sample = sink.samples[(segment * 128 * 2) as usize];
        assert!(
            (sample - expected).abs() < 1e-6,
            "segment {segment}: expected {expected}, got {sample}"
        );
    }
}

#[test]
fn test_invalid_block_size_fails_before_rendering() {
    init_logging();
    let config = RenderConfig::new("unused.wav")
        .with_duration(0.05)
        .with_block_size(16);
    let mut renderer = Renderer::new(config);
    let mut plugin = ScriptedPlugin::new();
    let mut sink = MemorySink::new();

    let err = renderer.run_with_sink(&mut plugin, &mut sink).unwrap_err();
    assert!(matches!(err, RenderError::InvalidBlockSize { got: 16, .. }));
    assert_eq!(renderer.state(), RenderState::Failed);
    assert_eq!(sink.blocks_written, 0);
}

#[test]
fn test_bad_automation_fails_before_any_write() {
    init_logging();
    let config = RenderConfig::new("unused.wav")
        .with_sample_rate(44100.0)
        .with_duration(0.05)
        .with_automation_json(r#"{"amp": {"0": 0.1, "0%": 0.2}}"#);
    let mut renderer = Renderer::new(config);
    let mut plugin = ScriptedPlugin::new();
    let mut sink = MemorySink::new();

    let err = renderer.run_with_sink(&mut plugin, &mut sink).unwrap_err();
    assert!(matches!(err, RenderError::Automation(_)));
    assert_eq!(sink.blocks_written, 0);
    assert!(!sink.finalized);
}

// ═══════════════════════════════════════════════════════════════════════════════
// FILE-BACKED PIPELINE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_mono_input_through_gain_to_stereo_file() {
    init_logging();
    let input = temp_wav("gain-in");
    let output = temp_wav("gain-out");
    std::fs::remove_file(&output).ok();

    // 1000 frames of constant 0.8, mono
    let mut writer = AudioFileWriter::open(&input, 44100.0, 1, 32).unwrap();
    let samples = vec![0.8f32; 1000];
    assert_eq!(writer.write(&samples, 1000), 1000);
    writer.finalize().unwrap();

    let config = RenderConfig::new(&output)
        .with_input(&input)
        .with_setting("gain", "0.5");
    let mut renderer = Renderer::new(config);
    let mut plugin = create_builtin("gain").unwrap();

    let report = renderer.run(plugin.as_mut()).unwrap();
    assert_eq!(report.frames_processed, 1000);

    // Mono input duplicated to both channels, scaled by 0.5
    let mut reader = AudioFileReader::open(&output).unwrap();
    assert_eq!(reader.channels(), 2);
    assert_eq!(reader.total_frames(), 1000);
    let mut buffer = vec![0.0f32; 1000 * 2];
    assert_eq!(reader.read(&mut buffer, 1000), 1000);
    assert!(buffer.iter().all(|&s| (s - 0.4).abs() < 1e-6));

    std::fs::remove_file(&input).ok();
    std::fs::remove_file(&output).ok();
}

#[test]
fn test_existing_output_requires_overwrite() {
    init_logging();
    let input = temp_wav("guard-in");
    let output = temp_wav("guard-out");

    let mut writer = AudioFileWriter::open(&input, 44100.0, 1, 32).unwrap();
    writer.write(&[0.1f32; 100], 100);
    writer.finalize().unwrap();
    std::fs::write(&output, b"precious data").unwrap();

    let config = RenderConfig::new(&output).with_input(&input);
    let mut renderer = Renderer::new(config);
    let mut plugin = create_builtin("passthrough").unwrap();
    let err = renderer.run(plugin.as_mut()).unwrap_err();
    assert!(matches!(err, RenderError::OutputExists(_)));
    assert_eq!(std::fs::read(&output).unwrap(), b"precious data");

    // Same render with overwrite enabled succeeds
    let config = RenderConfig::new(&output)
        .with_input(&input)
        .with_overwrite(true);
    let mut renderer = Renderer::new(config);
    let mut plugin = create_builtin("passthrough").unwrap();
    renderer.run(plugin.as_mut()).unwrap();
    assert!(AudioFileReader::open(&output).is_ok());

    std::fs::remove_file(&input).ok();
    std::fs::remove_file(&output).ok();
}

#[test]
fn test_dry_run_checks_inputs_without_touching_output() {
    init_logging();
    let output = temp_wav("dry-out");
    std::fs::remove_file(&output).ok();

    let config = RenderConfig::new(&output).with_input("/nonexistent/input.wav");
    let renderer = Renderer::new(config);
    let err = renderer.dry_run().unwrap_err();
    assert!(matches!(err, RenderError::InputNotFound(_)));
    assert!(!output.exists());
}
