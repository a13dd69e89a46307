//! Offline block-paced render loop
//!
//! Drives a processor from a raw MIDI byte stream and writes interleaved
//! PCM to a byte sink, one block at a time. Stream lifecycle is explicit:
//! after the input closes, a still-sounding note is held for a bounded
//! sustain window, then released so its tail can drain before the loop
//! terminates.

use std::io::{Read, Write};

use anyhow::Result;

use crate::midi::{self, MidiEvent};

use super::{AudioBlock, PcmWriter, Processor};

/// Blocks a sounding note is held after the input stream closes.
const SUSTAIN_WINDOW_BLOCKS: u32 = 100;

/// Offline rendering options
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Samples per block
    pub block_size: usize,
    /// Output channels (channel 0 duplicated)
    pub channels: usize,
    /// Render length in seconds. `None` runs until the input closes and
    /// the sustain window drains.
    pub duration: Option<f64>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            block_size: 512,
            channels: 2,
            duration: None,
        }
    }
}

/// Counters reported after a render completes
#[derive(Debug, Clone, Copy)]
pub struct RenderStats {
    /// Frames written to the PCM sink
    pub frames_written: u64,
    /// Blocks rendered
    pub blocks_rendered: u64,
    /// MIDI events decoded and applied
    pub events_applied: u64,
}

/// Stream lifecycle states, in order of progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    /// Input still open; decode whatever is available each block
    Streaming,
    /// Input closed with a note sounding; re-feed it for the window
    ClosedSustaining,
    /// No more MIDI; let the release tail play out
    Draining,
}

/// Per-invocation loop state. Lives for one render call; nothing about the
/// stream lifecycle is global.
struct RenderSession {
    samples_processed: u64,
    max_samples: Option<u64>,
    sustained_note: Option<MidiEvent>,
    stream_closed: bool,
    blocks_since_close: u32,
    state: StreamState,
}

impl RenderSession {
    fn new(max_samples: Option<u64>) -> Self {
        Self {
            samples_processed: 0,
            max_samples,
            sustained_note: None,
            stream_closed: false,
            blocks_since_close: 0,
            state: StreamState::Streaming,
        }
    }

    /// Record an applied event's effect on the held-note tracking
    fn observe(&mut self, event: MidiEvent) {
        match event {
            MidiEvent::NoteOn { velocity, .. } if velocity > 0.0 => {
                self.sustained_note = Some(event);
            }
            MidiEvent::NoteOn { .. } | MidiEvent::NoteOff { .. } => {
                self.sustained_note = None;
            }
            MidiEvent::ControlChange { .. } => {}
        }
    }

    /// Mark the input stream closed and pick the follow-on state
    fn close_stream(&mut self) {
        self.stream_closed = true;
        self.state = if self.sustained_note.is_some() {
            StreamState::ClosedSustaining
        } else {
            StreamState::Draining
        };
    }
}

/// Render MIDI bytes from `midi_in` into PCM bytes on `pcm_out`.
///
/// Each iteration decodes all currently-available complete messages,
/// applies them in order, renders exactly one block, and writes it out
/// immediately. With a duration configured the output is exactly
/// `duration * sample_rate` frames; otherwise the loop ends once the
/// stream has closed and the voice has drained to silence.
pub fn render<P, R, W>(
    processor: &mut P,
    midi_in: &mut R,
    pcm_out: W,
    options: &RenderOptions,
) -> Result<RenderStats>
where
    P: Processor,
    R: Read,
    W: Write,
{
    let max_samples = options
        .duration
        .map(|secs| (secs * options.sample_rate as f64) as u64);

    let mut session = RenderSession::new(max_samples);
    let mut block = AudioBlock::new(options.channels, options.block_size);
    let mut writer = PcmWriter::new(pcm_out);
    let mut blocks_rendered = 0u64;
    let mut events_applied = 0u64;

    processor.prepare(options.sample_rate as f32, options.block_size);

    loop {
        if let Some(max) = session.max_samples {
            if session.samples_processed >= max {
                break;
            }
        }

        match session.state {
            StreamState::Streaming => loop {
                match midi::read_event(midi_in) {
                    Ok(Some(event)) => {
                        processor.handle_event(event);
                        session.observe(event);
                        events_applied += 1;
                    }
                    Ok(None) => {
                        session.close_stream();
                        break;
                    }
                    Err(e) => {
                        eprintln!("Warning: MIDI input ended: {}", e);
                        session.close_stream();
                        break;
                    }
                }
            },
            StreamState::ClosedSustaining => {
                if session.blocks_since_close >= SUSTAIN_WINDOW_BLOCKS {
                    // Window over: release the held note and drain its tail
                    if let Some(MidiEvent::NoteOn { channel, note, .. }) =
                        session.sustained_note.take()
                    {
                        processor.handle_event(MidiEvent::NoteOff {
                            channel,
                            note,
                            velocity: 0.0,
                        });
                    }
                    session.state = StreamState::Draining;
                } else {
                    if let Some(event) = session.sustained_note {
                        processor.handle_event(event);
                    }
                    session.blocks_since_close += 1;
                }
            }
            StreamState::Draining => {}
        }

        block.clear();
        processor.render_block(&mut block);
        blocks_rendered += 1;

        let frames = match session.max_samples {
            Some(max) => {
                ((max - session.samples_processed).min(options.block_size as u64)) as usize
            }
            None => options.block_size,
        };
        writer.write_block(&block, frames)?;
        session.samples_processed += frames as u64;

        // Without a duration, stop once the drain has gone fully quiet
        if session.max_samples.is_none()
            && session.state == StreamState::Draining
            && block.peak() == 0.0
        {
            break;
        }
    }

    processor.release();

    Ok(RenderStats {
        frames_written: writer.frames_written(),
        blocks_rendered,
        events_applied,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamStore;
    use crate::synth::VoiceEngine;
    use std::io::Cursor;
    use std::sync::Arc;

    fn mono_options(duration: Option<f64>) -> RenderOptions {
        RenderOptions {
            sample_rate: 44100,
            block_size: 512,
            channels: 1,
            duration,
        }
    }

    fn frames_of(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    }

    fn block_peaks(samples: &[f32], block_size: usize) -> Vec<f32> {
        samples
            .chunks(block_size)
            .map(|b| b.iter().fold(0.0f32, |m, s| m.max(s.abs())))
            .collect()
    }

    #[test]
    fn test_note_then_eof_drains_to_bounded_silence() {
        let mut voice = VoiceEngine::new(Arc::new(ParamStore::new()));
        let mut input = Cursor::new(vec![0x90, 69, 127]);
        let mut out = Vec::new();

        let stats = render(&mut voice, &mut input, &mut out, &mono_options(None)).unwrap();

        // One streaming block, the 100-block sustain window, the release
        // tail, and one final silent block.
        assert_eq!(stats.blocks_rendered, 103);
        assert_eq!(stats.events_applied, 1);
        assert_eq!(out.len() as u64, stats.frames_written * 4);

        let samples = frames_of(&out);
        let peaks = block_peaks(&samples, 512);

        // Attack in the first block, then held magnitude
        assert!(peaks[0] > 0.1);
        // Trailing blocks trend down to silence
        let tail = &peaks[peaks.len() - 3..];
        assert!(tail[0] >= tail[1]);
        assert!(tail[1] >= tail[2]);
        assert_eq!(*peaks.last().unwrap(), 0.0);
    }

    #[test]
    fn test_first_block_attack_ramps() {
        let mut voice = VoiceEngine::new(Arc::new(ParamStore::new()));
        let mut input = Cursor::new(vec![0x90, 69, 127]);
        let mut out = Vec::new();

        render(&mut voice, &mut input, &mut out, &mono_options(None)).unwrap();

        let samples = frames_of(&out);
        let chunk_peaks = block_peaks(&samples[..128], 32);
        for pair in chunk_peaks.windows(2) {
            assert!(pair[1] >= pair[0], "attack not ramping: {:?}", chunk_peaks);
        }
    }

    #[test]
    fn test_finite_duration_is_exact() {
        let mut voice = VoiceEngine::new(Arc::new(ParamStore::new()));
        let mut input = Cursor::new(vec![0x90, 69, 127]);
        let mut out = Vec::new();

        let stats = render(
            &mut voice,
            &mut input,
            &mut out,
            &mono_options(Some(0.05)),
        )
        .unwrap();

        // 0.05 s at 44100 Hz is 2205 frames, not a whole number of blocks
        assert_eq!(stats.frames_written, 2205);
        assert_eq!(out.len(), 2205 * 4);
    }

    #[test]
    fn test_finite_duration_stereo_frame_count() {
        let mut voice = VoiceEngine::new(Arc::new(ParamStore::new()));
        let mut input = Cursor::new(vec![0x90, 60, 100]);
        let mut out = Vec::new();

        let options = RenderOptions {
            channels: 2,
            duration: Some(0.02),
            ..RenderOptions::default()
        };
        let stats = render(&mut voice, &mut input, &mut out, &options).unwrap();

        assert_eq!(stats.frames_written, 882);
        assert_eq!(out.len(), 882 * 2 * 4);

        // Stereo frames carry the same sample twice
        let samples = frames_of(&out);
        for frame in samples.chunks_exact(2) {
            assert_eq!(frame[0], frame[1]);
        }
    }

    #[test]
    fn test_empty_input_renders_single_silent_block() {
        let mut voice = VoiceEngine::new(Arc::new(ParamStore::new()));
        let mut input = Cursor::new(vec![]);
        let mut out = Vec::new();

        let stats = render(&mut voice, &mut input, &mut out, &mono_options(None)).unwrap();

        assert_eq!(stats.blocks_rendered, 1);
        assert_eq!(stats.events_applied, 0);
        assert!(frames_of(&out).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_note_on_off_in_same_block() {
        let mut voice = VoiceEngine::new(Arc::new(ParamStore::new()));
        let mut input = Cursor::new(vec![0x90, 69, 127, 0x80, 69, 0]);
        let mut out = Vec::new();

        let stats = render(&mut voice, &mut input, &mut out, &mono_options(None)).unwrap();

        // The note was released before the first sample was rendered, so
        // no sustain window opens and nothing sounds.
        assert_eq!(stats.blocks_rendered, 1);
        assert_eq!(stats.events_applied, 2);
        assert!(frames_of(&out).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_malformed_stream_closes_input() {
        let mut voice = VoiceEngine::new(Arc::new(ParamStore::new()));
        let mut input = Cursor::new(vec![0xFF, 0x90, 69, 127]);
        let mut out = Vec::new();

        let stats = render(&mut voice, &mut input, &mut out, &mono_options(None)).unwrap();

        // The bad status byte ends the read; the note behind it is
        // unreachable without resynchronization.
        assert_eq!(stats.events_applied, 0);
        assert_eq!(stats.blocks_rendered, 1);
        assert!(frames_of(&out).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_malformed_stream_after_note_still_sustains() {
        let mut voice = VoiceEngine::new(Arc::new(ParamStore::new()));
        let mut input = Cursor::new(vec![0x90, 69, 127, 0xFF]);
        let mut out = Vec::new();

        let stats = render(&mut voice, &mut input, &mut out, &mono_options(None)).unwrap();

        // The note decoded before the bad byte plays and drains normally
        assert_eq!(stats.events_applied, 1);
        assert_eq!(stats.blocks_rendered, 103);
    }

    #[test]
    fn test_skipped_messages_do_not_sustain() {
        let mut voice = VoiceEngine::new(Arc::new(ParamStore::new()));
        let mut input = Cursor::new(vec![0xC0, 5, 0xD0, 40]);
        let mut out = Vec::new();

        let stats = render(&mut voice, &mut input, &mut out, &mono_options(None)).unwrap();

        assert_eq!(stats.events_applied, 0);
        assert_eq!(stats.blocks_rendered, 1);
    }

    #[test]
    fn test_duration_zero_writes_nothing() {
        let mut voice = VoiceEngine::new(Arc::new(ParamStore::new()));
        let mut input = Cursor::new(vec![0x90, 69, 127]);
        let mut out = Vec::new();

        let stats = render(&mut voice, &mut input, &mut out, &mono_options(Some(0.0))).unwrap();

        assert_eq!(stats.frames_written, 0);
        assert!(out.is_empty());
    }
}
