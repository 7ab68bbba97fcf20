//! Audio file writing
//!
//! One WAV sink per render. 16- and 24-bit output is integer PCM, 32-bit is
//! float, matching the formats the render loop produces.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use rh_core::Sample;

use crate::{FileError, FileResult};

/// Sink for interleaved audio blocks
///
/// `write` reports the number of frames actually committed so the caller can
/// detect a short write; the orchestrator treats that as fatal.
pub trait AudioSink {
    /// Write `frames` interleaved frames, returning the frames committed
    fn write(&mut self, buffer: &[Sample], frames: usize) -> usize;

    /// Flush and close the sink
    fn finalize(&mut self) -> FileResult<()>;
}

/// WAV file writer
pub struct AudioFileWriter {
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    channels: usize,
    bit_depth: u32,
}

impl std::fmt::Debug for AudioFileWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioFileWriter")
            .field("channels", &self.channels)
            .field("bit_depth", &self.bit_depth)
            .finish_non_exhaustive()
    }
}

impl AudioFileWriter {
    /// Create a new WAV sink. An unsupported bit depth fails before any I/O.
    pub fn open<P: AsRef<Path>>(
        path: P,
        sample_rate: f64,
        channels: usize,
        bit_depth: u32,
    ) -> FileResult<Self> {
        let sample_format = match bit_depth {
            16 | 24 => hound::SampleFormat::Int,
            32 => hound::SampleFormat::Float,
            other => return Err(FileError::UnsupportedBitDepth(other)),
        };

        let spec = hound::WavSpec {
            channels: channels as u16,
            sample_rate: sample_rate as u32,
            bits_per_sample: bit_depth as u16,
            sample_format,
        };

        let writer = hound::WavWriter::create(path, spec)?;

        Ok(Self {
            writer: Some(writer),
            channels,
            bit_depth,
        })
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn bit_depth(&self) -> u32 {
        self.bit_depth
    }
}

impl AudioSink for AudioFileWriter {
    fn write(&mut self, buffer: &[Sample], frames: usize) -> usize {
        let Some(writer) = self.writer.as_mut() else {
            return 0;
        };

        for frame in 0..frames {
            for ch in 0..self.channels {
                let sample = buffer[frame * self.channels + ch];
                let written = match self.bit_depth {
                    16 => writer
                        .write_sample((sample.clamp(-1.0, 1.0) * 32767.0) as i16)
                        .is_ok(),
                    24 => writer
                        .write_sample((sample.clamp(-1.0, 1.0) * 8_388_607.0) as i32)
                        .is_ok(),
                    _ => writer.write_sample(sample).is_ok(),
                };
                if !written {
                    return frame;
                }
            }
        }

        frames
    }

    fn finalize(&mut self) -> FileResult<()> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
        }
        Ok(())
    }
}
