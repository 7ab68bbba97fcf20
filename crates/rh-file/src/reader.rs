//! Audio file reading
//!
//! `AudioFileReader` streams interleaved f32 frames from one WAV file.
//! `MultiReader` keeps N sources in lock-step and merges them into a single
//! interleaved buffer, concatenating each source's channels in attach order.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rh_core::Sample;

use crate::{FileError, FileResult};

/// Incremental WAV file reader
pub struct AudioFileReader {
    reader: hound::WavReader<BufReader<File>>,
    spec: hound::WavSpec,
    total_frames: u64,
    position: u64,
    path: String,
}

impl std::fmt::Debug for AudioFileReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioFileReader")
            .field("spec", &self.spec)
            .field("total_frames", &self.total_frames)
            .field("position", &self.position)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl AudioFileReader {
    /// Open a WAV file for streaming reads
    pub fn open<P: AsRef<Path>>(path: P) -> FileResult<Self> {
        let path = path.as_ref();
        let reader = hound::WavReader::open(path).map_err(|e| match e {
            hound::Error::IoError(ref io) if io.kind() == std::io::ErrorKind::NotFound => {
                FileError::NotFound(path.display().to_string())
            }
            other => FileError::Wav(other),
        })?;

        let spec = reader.spec();
        let total_frames = reader.duration() as u64;

        Ok(Self {
            reader,
            spec,
            total_frames,
            position: 0,
            path: path.display().to_string(),
        })
    }

    pub fn sample_rate(&self) -> f64 {
        self.spec.sample_rate as f64
    }

    pub fn channels(&self) -> usize {
        self.spec.channels as usize
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Read up to `frames` interleaved frames into `buffer`, returning the
    /// number of frames actually read. Integer samples are normalized to
    /// [-1, 1]; a malformed sample reads as silence.
    pub fn read(&mut self, buffer: &mut [Sample], frames: usize) -> usize {
        let channels = self.channels();
        let wanted = frames * channels;
        debug_assert!(buffer.len() >= wanted);

        let mut count = 0;
        match self.spec.sample_format {
            hound::SampleFormat::Float => {
                for sample in self.reader.samples::<f32>().take(wanted) {
                    buffer[count] = sample.unwrap_or(0.0);
                    count += 1;
                }
            }
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1i64 << (self.spec.bits_per_sample - 1)) as f32;
                for sample in self.reader.samples::<i32>().take(wanted) {
                    buffer[count] = sample.unwrap_or(0) as f32 * scale;
                    count += 1;
                }
            }
        }

        let frames_read = count / channels;
        self.position += frames_read as u64;
        frames_read
    }

    /// Seek to an absolute frame index. Fails if the position cannot be
    /// reached exactly.
    pub fn seek(&mut self, frame: u64) -> FileResult<()> {
        if frame > self.total_frames {
            return Err(FileError::SeekOutOfRange {
                requested: frame,
                total: self.total_frames,
            });
        }
        self.reader.seek(frame as u32)?;
        self.position = frame;
        Ok(())
    }
}

/// Synchronized reader over multiple input files
///
/// The first attached source establishes the session sample rate; every
/// later source must agree within 1.0 Hz or the attach fails without
/// mutating the reader.
#[derive(Default)]
pub struct MultiReader {
    readers: Vec<AudioFileReader>,
    scratch: Vec<Sample>,
}

impl MultiReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open and attach another input source
    pub fn attach<P: AsRef<Path>>(&mut self, path: P) -> FileResult<()> {
        let reader = AudioFileReader::open(path)?;

        if let Some(first) = self.readers.first() {
            let expected = first.sample_rate();
            let actual = reader.sample_rate();
            if (actual - expected).abs() > 1.0 {
                return Err(FileError::SampleRateMismatch {
                    path: reader.path().to_string(),
                    expected,
                    actual,
                });
            }
        }

        log::debug!(
            "attached input source: {} ({} ch, {} Hz, {} frames)",
            reader.path(),
            reader.channels(),
            reader.sample_rate(),
            reader.total_frames()
        );
        self.readers.push(reader);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }

    /// Session sample rate (0.0 when no sources are attached)
    pub fn sample_rate(&self) -> f64 {
        self.readers.first().map_or(0.0, |r| r.sample_rate())
    }

    /// Sum of all source channel counts
    pub fn total_channels(&self) -> usize {
        self.readers.iter().map(|r| r.channels()).sum()
    }

    /// Longest source length in frames
    pub fn max_frames(&self) -> u64 {
        self.readers.iter().map(|r| r.total_frames()).max().unwrap_or(0)
    }

    /// Read up to `frames` frames from every source and merge them into one
    /// interleaved buffer, source 0's channels first, then source 1's, and
    /// so on. Returns the minimum frame count read across all sources; the
    /// buffer is zero-filled first so shorter sources leave silence behind.
    pub fn read_interleaved(&mut self, buffer: &mut [Sample], frames: usize) -> usize {
        if self.readers.is_empty() {
            return 0;
        }

        let total_channels = self.total_channels();
        let needed = frames * total_channels;
        debug_assert!(buffer.len() >= needed);
        buffer[..needed].fill(0.0);

        if self.scratch.len() < needed {
            self.scratch.resize(needed, 0.0);
        }

        let mut min_frames = frames;
        let mut channel_offset = 0;

        for reader in &mut self.readers {
            let channels = reader.channels();
            let frames_read = reader.read(&mut self.scratch, frames);
            min_frames = min_frames.min(frames_read);

            for frame in 0..frames_read {
                for ch in 0..channels {
                    buffer[frame * total_channels + channel_offset + ch] =
                        self.scratch[frame * channels + ch];
                }
            }

            channel_offset += channels;
        }

        min_frames
    }

    /// Seek every source to the same absolute frame. Fails if any source
    /// cannot land exactly on that frame.
    pub fn seek_all(&mut self, frame: u64) -> FileResult<()> {
        for reader in &mut self.readers {
            reader.seek(frame)?;
        }
        Ok(())
    }
}
