//! Monophonic voice engine
//!
//! Owns the oscillator phase, current frequency, and envelope, and turns a
//! stream of MIDI events into rendered audio blocks. Exactly one logical
//! voice exists: a new note retunes the oscillator and restarts the
//! envelope, overriding whatever was still sounding.

use std::sync::Arc;

use crate::engine::{AudioBlock, Processor};
use crate::midi::MidiEvent;
use crate::params::ParamStore;
use crate::synth::{Envelope, Oscillator};

/// Convert a MIDI note number to Hz (12-TET, A4 = 440 at note 69).
pub fn note_to_frequency(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as i32 - 69) as f32 / 12.0)
}

/// The monophonic synthesis engine.
///
/// Waveform and gain are read from the shared parameter store once per
/// block; envelope and phase advance per sample. The split is deliberate
/// and audible, so it is part of the output contract.
pub struct VoiceEngine {
    params: Arc<ParamStore>,
    oscillator: Oscillator,
    envelope: Envelope,
    note_on: bool,
}

impl VoiceEngine {
    /// Create a voice reading from the given parameter store
    pub fn new(params: Arc<ParamStore>) -> Self {
        let frequency = params.frequency();
        Self {
            params,
            oscillator: Oscillator::new(frequency, 44100.0),
            envelope: Envelope::new(),
            note_on: false,
        }
    }

    /// Current oscillator phase in `[0, 1)`
    pub fn phase(&self) -> f32 {
        self.oscillator.phase()
    }

    /// Current envelope level
    pub fn envelope_level(&self) -> f32 {
        self.envelope.level()
    }

    /// True when no note is held and the release tail has fully decayed
    pub fn is_silent(&self) -> bool {
        !self.note_on && self.envelope.level() == 0.0
    }
}

impl Processor for VoiceEngine {
    fn prepare(&mut self, sample_rate: f32, _block_size: usize) {
        self.oscillator.set_sample_rate(sample_rate);
        self.oscillator.set_frequency(self.params.frequency());
        self.oscillator.reset();
    }

    fn handle_event(&mut self, event: MidiEvent) {
        match event {
            MidiEvent::NoteOn { note, velocity, .. } => {
                // A zero-velocity note on is a note off in disguise
                if velocity <= 0.0 {
                    self.note_on = false;
                } else {
                    self.oscillator.set_frequency(note_to_frequency(note));
                    self.note_on = true;
                    self.envelope.reset();
                }
            }
            MidiEvent::NoteOff { .. } => {
                self.note_on = false;
            }
            // Reserved for future parameters
            MidiEvent::ControlChange { .. } => {}
        }
    }

    fn render_block(&mut self, block: &mut AudioBlock) {
        let waveform = self.params.waveform();
        let gain = self.params.gain();

        for sample in block.channel_mut(0).iter_mut() {
            let level = self.envelope.advance(self.note_on);
            *sample = self.oscillator.tick(waveform) * level * gain;
        }

        block.duplicate_first_channel();
    }

    fn release(&mut self) {}
}
