//! The block-rendering loop
//!
//! Drives a hosted plugin through the input audio under the automation
//! schedule, block by block, writing interleaved output as it goes. Buffers
//! are allocated once outside the loop and reused every iteration.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use rh_automation::{parse_document, values_at, ParameterAutomation};
use rh_core::{defaults, parse_f64_strict, seconds_to_frames, Sample};
use rh_file::{AudioFileWriter, AudioSink, MultiReader};
use rh_plugin::{BusDirection, PluginEvent, PluginInstance};

use crate::{
    ensure_initialized, ProcessGate, RenderConfig, RenderError, RenderReport, RenderResult,
    RenderState,
};

/// Resolved inputs for one render pass
struct Configured {
    reader: MultiReader,
    automation: ParameterAutomation,
    sample_rate: f64,
    total_frames: u64,
    output_channels: usize,
}

/// Offline render orchestrator
///
/// Owns the session: total frame count, progress, state transitions, and the
/// processing gate. State and progress are observable from other threads
/// while `run` blocks the calling one.
pub struct Renderer {
    config: RenderConfig,
    state: Arc<RwLock<RenderState>>,
    frames_processed: Arc<AtomicU64>,
    total_frames: Arc<AtomicU64>,
    gate: Arc<ProcessGate>,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(RenderState::Configuring)),
            frames_processed: Arc::new(AtomicU64::new(0)),
            total_frames: Arc::new(AtomicU64::new(0)),
            gate: Arc::new(ProcessGate::new()),
        }
    }

    pub fn state(&self) -> RenderState {
        *self.state.read()
    }

    /// Fraction of the render completed, 0.0 - 1.0
    pub fn progress(&self) -> f64 {
        let total = self.total_frames.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        self.frames_processed.load(Ordering::Relaxed) as f64 / total as f64
    }

    /// Gate shared with any callback-driven path reusing the block primitive
    pub fn gate(&self) -> Arc<ProcessGate> {
        Arc::clone(&self.gate)
    }

    /// Validate the setup without touching the output
    pub fn dry_run(&self) -> RenderResult<()> {
        self.config.validate()?;

        for input in &self.config.inputs {
            if !input.exists() {
                return Err(RenderError::InputNotFound(input.display().to_string()));
            }
        }

        log::info!("dry run validation passed");
        Ok(())
    }

    /// Render to the configured output file
    pub fn run(&mut self, plugin: &mut dyn PluginInstance) -> RenderResult<RenderReport> {
        let setup = self.configure(plugin)?;

        if self.config.output.exists() && !self.config.overwrite {
            return Err(self.fail(RenderError::OutputExists(
                self.config.output.display().to_string(),
            )));
        }

        log::info!(
            "creating output writer: {} ({} ch, {} Hz, {}-bit)",
            self.config.output.display(),
            setup.output_channels,
            setup.sample_rate,
            self.config.bit_depth
        );
        let mut sink = AudioFileWriter::open(
            &self.config.output,
            setup.sample_rate,
            setup.output_channels,
            self.config.bit_depth,
        )
        .map_err(|e| self.fail(e.into()))?;

        self.render(plugin, setup, &mut sink)
    }

    /// Render into a caller-supplied sink instead of the configured file
    pub fn run_with_sink(
        &mut self,
        plugin: &mut dyn PluginInstance,
        sink: &mut dyn AudioSink,
    ) -> RenderResult<RenderReport> {
        let setup = self.configure(plugin)?;
        self.render(plugin, setup, sink)
    }

    /// Resolve the session: attach inputs, fix the sample rate and total
    /// frame count, parse automation, prepare the plugin, and apply the
    /// one-time parameter settings. All validation happens here, before any
    /// output I/O.
    fn configure(&mut self, plugin: &mut dyn PluginInstance) -> RenderResult<Configured> {
        ensure_initialized();
        *self.state.write() = RenderState::Configuring;

        self.config.validate().map_err(|e| self.fail(e))?;

        let mut reader = MultiReader::new();
        if !self.config.inputs.is_empty() {
            log::info!("loading {} input file(s)", self.config.inputs.len());
            for input in &self.config.inputs {
                reader.attach(input).map_err(|e| self.fail(e.into()))?;
            }
        }

        let has_input = !reader.is_empty();
        let sample_rate = self
            .config
            .sample_rate
            .or_else(|| has_input.then(|| reader.sample_rate()))
            .unwrap_or(defaults::SAMPLE_RATE);

        let total_frames = if has_input {
            let total = reader.max_frames();
            log::info!(
                "audio input configured: {} Hz, {} channels, {} frames",
                sample_rate,
                reader.total_channels(),
                total
            );
            total
        } else {
            let duration = self
                .config
                .duration
                .unwrap_or(defaults::INSTRUMENT_DURATION_SECONDS);
            log::info!(
                "instrument mode, no audio input: {} Hz, {} s",
                sample_rate,
                duration
            );
            seconds_to_frames(duration, sample_rate)
        };
        self.total_frames.store(total_frames, Ordering::Relaxed);
        self.frames_processed.store(0, Ordering::Relaxed);

        let automation = match &self.config.automation_json {
            Some(json) => {
                let automation = parse_document(json, sample_rate, total_frames)
                    .map_err(|e| self.fail(e.into()))?;
                log::info!("automation loaded: {} parameter(s)", automation.len());
                automation
            }
            None => ParameterAutomation::new(),
        };

        plugin
            .prepare(sample_rate, self.config.block_size)
            .map_err(|e| self.fail(e.into()))?;

        // One-time settings: invalid entries are skipped, not fatal
        for (name, raw_value) in &self.config.settings {
            match parse_f64_strict(raw_value) {
                Ok(value) => {
                    if let Err(e) = plugin.set_parameter(name, value as Sample) {
                        log::warn!("failed to set parameter '{name}': {e}");
                    } else {
                        log::debug!("set parameter '{name}' = {value}");
                    }
                }
                Err(_) => {
                    log::warn!("invalid value for parameter '{name}': '{raw_value}'");
                }
            }
        }

        let output_channels = plugin
            .channel_count(BusDirection::Output)
            .clamp(1, defaults::OUTPUT_CHANNELS);

        Ok(Configured {
            reader,
            automation,
            sample_rate,
            total_frames,
            output_channels,
        })
    }

    /// Run the steady-state loop, then drain and report
    fn render(
        &mut self,
        plugin: &mut dyn PluginInstance,
        mut setup: Configured,
        sink: &mut dyn AudioSink,
    ) -> RenderResult<RenderReport> {
        plugin.start_processing().map_err(|e| self.fail(e.into()))?;
        self.gate.enable();
        *self.state.write() = RenderState::Rendering;

        log::info!(
            "starting render: block size {}, {} total frames",
            self.config.block_size,
            setup.total_frames
        );

        let start = Instant::now();
        let loop_result = self.render_loop(plugin, &mut setup, sink);

        // Draining: always stop the plugin cleanly, even after a failure
        *self.state.write() = RenderState::Draining;
        self.gate.disable();
        if let Err(e) = plugin.stop_processing() {
            log::warn!("failed to stop plugin processing: {e}");
        }
        let finalize_result = sink.finalize();

        let elapsed = start.elapsed();
        let frames_processed = self.frames_processed.load(Ordering::Relaxed);
        let rendered_seconds = frames_processed as f64 / setup.sample_rate;
        let realtime_factor = if elapsed.as_secs_f64() > 0.0 {
            rendered_seconds / elapsed.as_secs_f64()
        } else {
            0.0
        };

        log::info!(
            "render stopped: {} frames in {:.3} s ({:.2}x realtime)",
            frames_processed,
            elapsed.as_secs_f64(),
            realtime_factor
        );

        match loop_result {
            Ok(blocks_processed) => {
                finalize_result.map_err(|e| self.fail(e.into()))?;
                *self.state.write() = RenderState::Finished;
                Ok(RenderReport {
                    state: RenderState::Finished,
                    frames_processed,
                    blocks_processed,
                    elapsed,
                    realtime_factor,
                })
            }
            Err(e) => {
                if let Err(fe) = finalize_result {
                    log::warn!("failed to finalize output after render failure: {fe}");
                }
                Err(self.fail(e))
            }
        }
    }

    /// The steady-state block loop. Returns the number of blocks processed.
    fn render_loop(
        &self,
        plugin: &mut dyn PluginInstance,
        setup: &mut Configured,
        sink: &mut dyn AudioSink,
    ) -> RenderResult<u64> {
        let block_size = self.config.block_size;
        // Automation resolution: once per block unless configured finer
        let resolution = self
            .config
            .automation_interval
            .unwrap_or(block_size)
            .clamp(1, block_size);

        let has_input = !setup.reader.is_empty();
        let input_channels = if has_input {
            setup.reader.total_channels()
        } else {
            defaults::OUTPUT_CHANNELS
        };

        // Reusable scratch buffers, allocated once for the whole run
        let mut input_buffer = vec![0.0 as Sample; block_size * input_channels];
        let mut output_buffer = vec![0.0 as Sample; block_size * setup.output_channels];

        let mut frames_processed: u64 = 0;
        let mut blocks_processed: u64 = 0;
        let progress_stride =
            (setup.sample_rate * defaults::PROGRESS_INTERVAL_SECONDS as f64) as u64;
        let mut next_progress = progress_stride.max(1);

        while frames_processed < setup.total_frames {
            let frames_this_block =
                block_size.min((setup.total_frames - frames_processed) as usize);

            input_buffer.fill(0.0);
            output_buffer.fill(0.0);

            if has_input {
                let frames_read = setup
                    .reader
                    .read_interleaved(&mut input_buffer, frames_this_block);
                if frames_read < frames_this_block {
                    log::debug!(
                        "reached end of input audio at frame {} ({} frames read)",
                        frames_processed,
                        frames_read
                    );
                }
            } else if frames_processed == 0 {
                // Instrument mode: give the plugin one note to play
                let event = PluginEvent::note_on(
                    defaults::MIDI_MIDDLE_C,
                    defaults::MIDI_DEFAULT_VELOCITY,
                    defaults::MIDI_DEFAULT_CHANNEL,
                    defaults::MIDI_NOTE_DURATION_SECONDS,
                    setup.sample_rate,
                    0,
                );
                match plugin.inject_input_event(0, event) {
                    Ok(()) => log::info!(
                        "injected note-on event: pitch {}, velocity {}",
                        defaults::MIDI_MIDDLE_C,
                        defaults::MIDI_DEFAULT_VELOCITY
                    ),
                    Err(e) => log::warn!("no event input available for note injection: {e}"),
                }
            }

            let mut offset = 0usize;
            while offset < frames_this_block {
                let segment = resolution.min(frames_this_block - offset);
                let segment_start = frames_processed + offset as u64;

                plugin.advance_transport(segment as u64);

                // Automation is sampled at the segment's first frame
                for (name, value) in values_at(&setup.automation, segment_start) {
                    if let Err(e) = plugin.set_parameter(name, value) {
                        log::trace!("automation target '{name}' rejected: {e}");
                    }
                }

                if has_input {
                    scatter_input(
                        plugin,
                        &input_buffer[offset * input_channels..],
                        input_channels,
                        segment,
                    );
                }

                // A failed block is logged and skipped, never fatal; the
                // output buffer keeps whatever the plugin wrote
                if self.gate.is_enabled() {
                    if let Err(e) = plugin.process(segment) {
                        log::warn!("plugin processing failed at frame {segment_start}: {e}");
                    }
                }

                collect_output(
                    plugin,
                    &mut output_buffer[offset * setup.output_channels..],
                    setup.output_channels,
                    segment,
                );

                offset += segment;
            }

            // A short write means a corrupt output file: abort immediately
            let written = sink.write(
                &output_buffer[..frames_this_block * setup.output_channels],
                frames_this_block,
            );
            if written < frames_this_block {
                log::error!(
                    "failed to write complete block at frame {}: expected {}, wrote {}",
                    frames_processed,
                    frames_this_block,
                    written
                );
                return Err(RenderError::ShortWrite {
                    frame: frames_processed,
                    expected: frames_this_block,
                    written,
                });
            }

            frames_processed += frames_this_block as u64;
            blocks_processed += 1;
            self.frames_processed.store(frames_processed, Ordering::Relaxed);

            if frames_processed >= next_progress && frames_processed < setup.total_frames {
                let percent = frames_processed as f64 / setup.total_frames as f64 * 100.0;
                log::info!("processing progress: {percent:.1}%");
                next_progress += progress_stride.max(1);
            }
        }

        Ok(blocks_processed)
    }

    /// Record the failure state and pass the error through
    fn fail(&self, err: RenderError) -> RenderError {
        *self.state.write() = RenderState::Failed;
        err
    }
}

/// Copy interleaved input into the plugin's planar input buffers.
///
/// Mono input is duplicated to both plugin channels; multi-channel input
/// feeds its first two channels 1:1.
fn scatter_input(
    plugin: &mut dyn PluginInstance,
    interleaved: &[Sample],
    source_channels: usize,
    frames: usize,
) {
    if plugin.channel_count(BusDirection::Input) == 0 {
        return;
    }

    if source_channels == 1 {
        if let Some(left) = plugin.input_channel_mut(0, 0) {
            let n = frames.min(left.len());
            left[..n].copy_from_slice(&interleaved[..n]);
        }
        if let Some(right) = plugin.input_channel_mut(0, 1) {
            let n = frames.min(right.len());
            right[..n].copy_from_slice(&interleaved[..n]);
        }
    } else {
        if let Some(left) = plugin.input_channel_mut(0, 0) {
            for i in 0..frames.min(left.len()) {
                left[i] = interleaved[i * source_channels];
            }
        }
        if let Some(right) = plugin.input_channel_mut(0, 1) {
            for i in 0..frames.min(right.len()) {
                right[i] = interleaved[i * source_channels + 1];
            }
        }
    }
}

/// Copy the plugin's planar output back into interleaved form.
///
/// Mono output copies the left channel; stereo interleaves, duplicating the
/// left buffer when no right buffer exists. If the plugin exposes no output
/// buffers the block stays silent.
fn collect_output(
    plugin: &dyn PluginInstance,
    interleaved: &mut [Sample],
    output_channels: usize,
    frames: usize,
) {
    let Some(left) = plugin.output_channel(0, 0) else {
        log::warn!("failed to access plugin output buffers");
        return;
    };

    if output_channels == 1 {
        let n = frames.min(left.len());
        interleaved[..n].copy_from_slice(&left[..n]);
    } else {
        let right = plugin.output_channel(0, 1);
        for i in 0..frames.min(left.len()) {
            interleaved[i * 2] = left[i];
            interleaved[i * 2 + 1] = right.map_or(left[i], |r| r[i]);
        }
    }
}
