//! Synthesis parameter store
//!
//! A fixed set of typed parameters shared between the audio thread and
//! writers on other threads (CLI, presets, network relay). Each value lives
//! in its own atomic, so the render path reads without taking any lock and
//! writers never stall the audio callback.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use anyhow::{bail, Result};

use crate::synth::Waveform;

/// Lowest settable oscillator frequency in Hz
pub const MIN_FREQUENCY: f32 = 20.0;
/// Highest settable oscillator frequency in Hz
pub const MAX_FREQUENCY: f32 = 20000.0;

const DEFAULT_FREQUENCY: f32 = 440.0;
const DEFAULT_GAIN: f32 = 0.7;

/// Shared parameter store.
///
/// Values are always within their declared ranges: out-of-range writes are
/// clamped to the nearest bound and logged, never rejected.
pub struct ParamStore {
    /// Oscillator frequency in Hz, stored as f32 bits
    frequency: AtomicU32,
    /// Output gain in `[0, 1]`, stored as f32 bits
    gain: AtomicU32,
    /// Selected waveform index
    waveform: AtomicUsize,
}

impl ParamStore {
    /// Create a store with default values (440 Hz, 0.7 gain, sine)
    pub fn new() -> Self {
        Self {
            frequency: AtomicU32::new(DEFAULT_FREQUENCY.to_bits()),
            gain: AtomicU32::new(DEFAULT_GAIN.to_bits()),
            waveform: AtomicUsize::new(Waveform::Sine.index()),
        }
    }

    /// Get the oscillator frequency in Hz
    pub fn frequency(&self) -> f32 {
        f32::from_bits(self.frequency.load(Ordering::Relaxed))
    }

    /// Get the output gain
    pub fn gain(&self) -> f32 {
        f32::from_bits(self.gain.load(Ordering::Relaxed))
    }

    /// Get the selected waveform
    pub fn waveform(&self) -> Waveform {
        Waveform::from_index(self.waveform.load(Ordering::Relaxed))
    }

    /// Set the oscillator frequency, clamped to `[20, 20000]` Hz
    pub fn set_frequency(&self, hz: f32) {
        let clamped = hz.clamp(MIN_FREQUENCY, MAX_FREQUENCY);
        if clamped != hz {
            eprintln!("Warning: frequency {} out of range, clamped to {}", hz, clamped);
        }
        self.frequency.store(clamped.to_bits(), Ordering::Relaxed);
    }

    /// Set the output gain, clamped to `[0, 1]`
    pub fn set_gain(&self, gain: f32) {
        let clamped = gain.clamp(0.0, 1.0);
        if clamped != gain {
            eprintln!("Warning: gain {} out of range, clamped to {}", gain, clamped);
        }
        self.gain.store(clamped.to_bits(), Ordering::Relaxed);
    }

    /// Set the waveform
    pub fn set_waveform(&self, waveform: Waveform) {
        self.waveform.store(waveform.index(), Ordering::Relaxed);
    }

    /// Set a parameter by name. Waveform takes its value as an index.
    pub fn set_named(&self, name: &str, value: f32) -> Result<()> {
        match name {
            "frequency" => self.set_frequency(value),
            "gain" => self.set_gain(value),
            "waveform" => self.set_waveform(Waveform::from_index(value as usize)),
            _ => bail!("unknown parameter '{}'", name),
        }
        Ok(())
    }

    /// Get a parameter by name
    pub fn get_named(&self, name: &str) -> Option<f32> {
        match name {
            "frequency" => Some(self.frequency()),
            "gain" => Some(self.gain()),
            "waveform" => Some(self.waveform().index() as f32),
            _ => None,
        }
    }
}

impl Default for ParamStore {
    fn default() -> Self {
        Self::new()
    }
}
