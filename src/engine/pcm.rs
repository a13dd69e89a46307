//! Raw PCM byte writer
//!
//! Serializes rendered blocks as interleaved 32-bit IEEE-754 float samples
//! in native byte order, flushing after every block so downstream consumers
//! see audio as it is produced rather than at end of stream.

use std::io::Write;

use anyhow::{Context, Result};

use super::AudioBlock;

/// Streaming PCM writer over any byte sink.
pub struct PcmWriter<W: Write> {
    writer: W,
    scratch: Vec<u8>,
    frames_written: u64,
}

impl<W: Write> PcmWriter<W> {
    /// Create a writer over the given sink
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            scratch: Vec::new(),
            frames_written: 0,
        }
    }

    /// Number of frames written so far
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Write the first `frames` frames of a block, interleaved, and flush.
    pub fn write_block(&mut self, block: &AudioBlock, frames: usize) -> Result<()> {
        let frames = frames.min(block.len());

        self.scratch.clear();
        for i in 0..frames {
            for channel in 0..block.channels() {
                self.scratch
                    .extend_from_slice(&block.channel(channel)[i].to_ne_bytes());
            }
        }

        self.writer
            .write_all(&self.scratch)
            .context("failed to write PCM block")?;
        self.writer.flush().context("failed to flush PCM output")?;

        self.frames_written += frames as u64;
        Ok(())
    }
}
