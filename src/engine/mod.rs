//! Audio engine: block buffers, the processor seam, and transports
//!
//! A `Processor` renders fixed-size blocks on demand. Two transports drive
//! it: the offline render loop (MIDI bytes in, PCM bytes out) and the live
//! cpal player fed by the UDP relay and hardware MIDI inputs.

mod input;
mod offline;
mod pcm;
mod player;
mod recorder;
mod relay;

pub use input::{list_input_ports, MidiInputs};
pub use offline::{render, RenderOptions, RenderStats};
pub use pcm::PcmWriter;
pub use player::{default_device_name, list_output_devices, Player};
pub use recorder::Recorder;
pub use relay::{MidiRelay, DEFAULT_RELAY_PORT};

use crate::midi::MidiEvent;

/// Capability interface between the synthesis core and whichever transport
/// currently owns it.
pub trait Processor: Send {
    /// Reset for playback at the given sample rate and block size.
    /// Idempotent; never called concurrently with `render_block`.
    fn prepare(&mut self, sample_rate: f32, block_size: usize);

    /// Apply one MIDI event to the synthesis state
    fn handle_event(&mut self, event: MidiEvent);

    /// Fill the block in place. Must not allocate, block, or take locks.
    fn render_block(&mut self, block: &mut AudioBlock);

    /// Release playback resources
    fn release(&mut self);
}

/// An owned buffer of `channels x len` samples in `[-1, 1]`.
///
/// Samples are stored planar (one contiguous run per channel) so a mono
/// renderer can fill channel 0 and duplicate it outward; interleaving
/// happens at the byte-writer boundary. The length can be shrunk below the
/// allocated capacity without reallocating, for transports whose callback
/// sizes vary.
pub struct AudioBlock {
    channels: usize,
    capacity: usize,
    len: usize,
    data: Vec<f32>,
}

impl AudioBlock {
    /// Create a zeroed block
    pub fn new(channels: usize, len: usize) -> Self {
        Self {
            channels,
            capacity: len,
            len,
            data: vec![0.0; channels * len],
        }
    }

    /// Number of channels
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Samples per channel
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the block holds no samples
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Shrink or restore the per-channel length, within capacity.
    /// Does not allocate.
    pub fn set_len(&mut self, len: usize) {
        assert!(len <= self.capacity, "block length exceeds capacity");
        self.len = len;
    }

    /// Zero every sample
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// Borrow one channel's samples
    pub fn channel(&self, channel: usize) -> &[f32] {
        let start = channel * self.capacity;
        &self.data[start..start + self.len]
    }

    /// Mutably borrow one channel's samples
    pub fn channel_mut(&mut self, channel: usize) -> &mut [f32] {
        let start = channel * self.capacity;
        &mut self.data[start..start + self.len]
    }

    /// Copy channel 0 verbatim into every other channel
    pub fn duplicate_first_channel(&mut self) {
        let len = self.len;
        let (first, rest) = self.data.split_at_mut(self.capacity);
        for channel in rest.chunks_mut(self.capacity) {
            channel[..len].copy_from_slice(&first[..len]);
        }
    }

    /// Peak absolute sample value across all channels
    pub fn peak(&self) -> f32 {
        let mut max = 0.0f32;
        for channel in 0..self.channels {
            for &sample in self.channel(channel) {
                max = max.max(sample.abs());
            }
        }
        max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_shape() {
        let block = AudioBlock::new(2, 512);
        assert_eq!(block.channels(), 2);
        assert_eq!(block.len(), 512);
        assert_eq!(block.channel(0).len(), 512);
        assert_eq!(block.channel(1).len(), 512);
    }

    #[test]
    fn test_block_clear() {
        let mut block = AudioBlock::new(1, 16);
        block.channel_mut(0)[3] = 0.5;
        block.clear();
        assert!(block.channel(0).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_duplicate_first_channel() {
        let mut block = AudioBlock::new(3, 8);
        for (i, sample) in block.channel_mut(0).iter_mut().enumerate() {
            *sample = i as f32 / 8.0;
        }
        block.duplicate_first_channel();

        for ch in 1..3 {
            for i in 0..8 {
                assert_eq!(block.channel(ch)[i], block.channel(0)[i]);
            }
        }
    }

    #[test]
    fn test_block_peak() {
        let mut block = AudioBlock::new(2, 4);
        block.channel_mut(1)[2] = -0.8;
        assert_eq!(block.peak(), 0.8);
    }

    #[test]
    fn test_set_len_within_capacity() {
        let mut block = AudioBlock::new(2, 512);
        block.set_len(100);
        assert_eq!(block.len(), 100);
        assert_eq!(block.channel(0).len(), 100);
        assert_eq!(block.channel(1).len(), 100);

        block.set_len(512);
        assert_eq!(block.len(), 512);
    }

    #[test]
    fn test_shrunk_block_duplicates_correctly() {
        let mut block = AudioBlock::new(2, 512);
        block.set_len(4);
        block.channel_mut(0).copy_from_slice(&[0.1, 0.2, 0.3, 0.4]);
        block.duplicate_first_channel();
        assert_eq!(block.channel(1), &[0.1, 0.2, 0.3, 0.4]);
    }
}
