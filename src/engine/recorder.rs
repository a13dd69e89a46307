//! WAV file recorder
//!
//! Captures rendered blocks to 32-bit float WAV files.

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use super::AudioBlock;

/// WAV file recorder
pub struct Recorder {
    writer: WavWriter<BufWriter<File>>,
    sample_rate: u32,
    channels: u16,
    frames_written: u64,
}

impl Recorder {
    /// Create a new recorder
    ///
    /// # Arguments
    /// * `path` - Output file path
    /// * `sample_rate` - Sample rate in Hz
    /// * `channels` - Number of interleaved channels
    pub fn new(path: &Path, sample_rate: u32, channels: u16) -> Result<Self> {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };

        let writer = WavWriter::create(path, spec)
            .with_context(|| format!("failed to create WAV file: {:?}", path))?;

        Ok(Self {
            writer,
            sample_rate,
            channels,
            frames_written: 0,
        })
    }

    /// Get the sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the number of frames written
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Get the duration recorded in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frames_written as f64 / self.sample_rate as f64
    }

    /// Write the first `frames` frames of a block, interleaved
    pub fn write_block(&mut self, block: &AudioBlock, frames: usize) -> Result<()> {
        let frames = frames.min(block.len());
        for i in 0..frames {
            for channel in 0..self.channels as usize {
                self.writer
                    .write_sample(block.channel(channel)[i])
                    .context("failed to write sample")?;
            }
        }
        self.frames_written += frames as u64;
        Ok(())
    }

    /// Finalize the WAV file
    ///
    /// This must be called to properly close the file and write the header.
    pub fn finalize(self) -> Result<()> {
        self.writer.finalize().context("failed to finalize WAV file")
    }
}
