//! Host-wide default constants

/// Sample rate used when neither an input file nor a flag provides one
pub const SAMPLE_RATE: f64 = 44100.0;

/// Default processing block size in frames
pub const BLOCK_SIZE: usize = 512;

/// Allowed block size range
pub const MIN_BLOCK_SIZE: usize = 32;
pub const MAX_BLOCK_SIZE: usize = 8192;

/// Default output bit depth
pub const BIT_DEPTH: u32 = 32;

/// Default number of output channels
pub const OUTPUT_CHANNELS: usize = 2;

/// Default render duration for instrument mode (no audio input)
pub const INSTRUMENT_DURATION_SECONDS: f64 = 10.0;

/// Seconds of rendered audio between progress log lines
pub const PROGRESS_INTERVAL_SECONDS: u64 = 5;

/// MIDI note injected for instrument plugins
pub const MIDI_MIDDLE_C: u8 = 60;
pub const MIDI_DEFAULT_VELOCITY: f32 = 0.8;
pub const MIDI_DEFAULT_CHANNEL: u8 = 0;
pub const MIDI_NOTE_DURATION_SECONDS: f64 = 8.0;
