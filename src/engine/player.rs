//! Real-time audio playback using cpal
//!
//! The output callback owns the processor outright: MIDI events arrive
//! through a channel drained at the start of each block, and parameters
//! cross over through the atomic store, so the callback never takes a lock
//! or allocates.

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use crate::midi::MidiEvent;

use super::{AudioBlock, Processor};

/// Samples rendered per processor invocation inside the callback. Larger
/// device buffers are served in chunks of this size, so the per-block
/// parameter read keeps the same cadence as offline rendering.
const LIVE_BLOCK_SIZE: usize = 512;

/// Real-time audio player
pub struct Player {
    stream: Option<Stream>,
    running: Arc<AtomicBool>,
}

impl Player {
    /// Create a new player
    pub fn new() -> Self {
        Self {
            stream: None,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start playing audio from the processor, fed by the event receiver.
    ///
    /// Fails if no output device is available; that is fatal to startup,
    /// not something to retry.
    pub fn start(
        &mut self,
        processor: Box<dyn Processor>,
        events: Receiver<MidiEvent>,
    ) -> Result<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("No output device available"))?;

        let config = device
            .default_output_config()
            .context("failed to query output device configuration")?;
        let sample_format = config.sample_format();
        let stream_config: StreamConfig = config.into();

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();

        let stream = match sample_format {
            SampleFormat::F32 => {
                self.build_stream::<f32>(&device, &stream_config, processor, events, running)?
            }
            SampleFormat::I16 => {
                self.build_stream::<i16>(&device, &stream_config, processor, events, running)?
            }
            SampleFormat::U16 => {
                self.build_stream::<u16>(&device, &stream_config, processor, events, running)?
            }
            _ => return Err(anyhow!("Unsupported sample format")),
        };

        stream.play().context("failed to start audio stream")?;
        self.stream = Some(stream);

        Ok(())
    }

    /// Stop playback. In-flight callbacks finish before the stream drops.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.stream = None;
    }

    /// Check if currently playing
    pub fn is_playing(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn build_stream<T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>>(
        &self,
        device: &Device,
        config: &StreamConfig,
        mut processor: Box<dyn Processor>,
        events: Receiver<MidiEvent>,
        running: Arc<AtomicBool>,
    ) -> Result<Stream> {
        let channels = config.channels as usize;
        let sample_rate = config.sample_rate.0 as f32;

        processor.prepare(sample_rate, LIVE_BLOCK_SIZE);
        let mut block = AudioBlock::new(channels, LIVE_BLOCK_SIZE);

        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                if !running.load(Ordering::SeqCst) {
                    // Fill with silence when stopped
                    for sample in data.iter_mut() {
                        *sample = T::from_sample(0.0f32);
                    }
                    return;
                }

                // Events queued before this callback apply now; anything
                // arriving mid-render waits for the next block.
                while let Ok(event) = events.try_recv() {
                    processor.handle_event(event);
                }

                let total_frames = data.len() / channels;
                let mut offset = 0;
                while offset < total_frames {
                    let frames = (total_frames - offset).min(LIVE_BLOCK_SIZE);
                    block.set_len(frames);
                    block.clear();
                    processor.render_block(&mut block);

                    for i in 0..frames {
                        for channel in 0..channels {
                            data[(offset + i) * channels + channel] =
                                T::from_sample(block.channel(channel)[i]);
                        }
                    }
                    offset += frames;
                }
            },
            |err| {
                eprintln!("Audio stream error: {}", err);
            },
            None,
        )?;

        Ok(stream)
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

/// Get the default output device name
pub fn default_device_name() -> Option<String> {
    let host = cpal::default_host();
    host.default_output_device().and_then(|d| d.name().ok())
}

/// List all available output devices
pub fn list_output_devices() -> Vec<(String, StreamConfig)> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    if let Ok(output_devices) = host.output_devices() {
        for device in output_devices {
            if let (Ok(name), Ok(config)) = (device.name(), device.default_output_config()) {
                devices.push((name, config.into()));
            }
        }
    }

    devices
}
