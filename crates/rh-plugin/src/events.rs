//! Plugin input events

use rh_core::seconds_to_frames;

/// Note event injected into a plugin's input event queue
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PluginEvent {
    NoteOn {
        channel: u8,
        pitch: u8,
        velocity: f32,
        /// Note length in frames
        length: u64,
        /// Offset within the current block
        sample_offset: u32,
    },
    NoteOff {
        channel: u8,
        pitch: u8,
        sample_offset: u32,
    },
}

impl PluginEvent {
    /// Build a note-on with a duration expressed in seconds
    pub fn note_on(
        pitch: u8,
        velocity: f32,
        channel: u8,
        duration_seconds: f64,
        sample_rate: f64,
        sample_offset: u32,
    ) -> Self {
        Self::NoteOn {
            channel,
            pitch,
            velocity,
            length: seconds_to_frames(duration_seconds, sample_rate),
            sample_offset,
        }
    }

    pub fn note_off(pitch: u8, channel: u8, sample_offset: u32) -> Self {
        Self::NoteOff {
            channel,
            pitch,
            sample_offset,
        }
    }
}
