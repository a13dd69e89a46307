//! Basic oscillator implementation

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Waveform types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// Look up a waveform by index. Out-of-range indices fall back to sine.
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Waveform::Sine,
            1 => Waveform::Square,
            2 => Waveform::Sawtooth,
            3 => Waveform::Triangle,
            _ => Waveform::Sine,
        }
    }

    /// Get the index of this waveform
    pub fn index(&self) -> usize {
        match self {
            Waveform::Sine => 0,
            Waveform::Square => 1,
            Waveform::Sawtooth => 2,
            Waveform::Triangle => 3,
        }
    }

    /// Map a phase in `[0, 1)` to a sample in `[-1, 1]`.
    pub fn sample(&self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (phase * 2.0 * PI).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Triangle => {
                if phase < 0.5 {
                    4.0 * phase - 1.0
                } else {
                    3.0 - 4.0 * phase
                }
            }
        }
    }
}

/// Phase accumulator driving the waveform functions.
///
/// Phase advances by `frequency / sample_rate` per sample and is
/// re-normalized into `[0, 1)` after every increment. It is never reset
/// between blocks, so accumulation stays exact across block boundaries.
pub struct Oscillator {
    phase: f32,
    frequency: f32,
    sample_rate: f32,
}

impl Oscillator {
    /// Create a new oscillator
    pub fn new(frequency: f32, sample_rate: f32) -> Self {
        Self {
            phase: 0.0,
            frequency,
            sample_rate,
        }
    }

    /// Set the frequency
    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
    }

    /// Get the current frequency
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Set the sample rate
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Get the current phase
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Reset the phase
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Advance the phase by one sample and generate the next sample
    /// of the given waveform.
    pub fn tick(&mut self, waveform: Waveform) -> f32 {
        self.phase += self.frequency / self.sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        waveform.sample(self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_waveforms_in_range() {
        let waveforms = [
            Waveform::Sine,
            Waveform::Square,
            Waveform::Sawtooth,
            Waveform::Triangle,
        ];

        for waveform in waveforms {
            for i in 0..1000 {
                let phase = i as f32 / 1000.0;
                let sample = waveform.sample(phase);
                assert!(
                    (-1.0..=1.0).contains(&sample),
                    "{:?} out of range at phase {}: {}",
                    waveform,
                    phase,
                    sample
                );
            }
        }
    }

    #[test]
    fn test_sawtooth_ramp() {
        assert_eq!(Waveform::Sawtooth.sample(0.0), -1.0);
        assert_eq!(Waveform::Sawtooth.sample(0.25), -0.5);
        assert_eq!(Waveform::Sawtooth.sample(0.5), 0.0);
        assert_eq!(Waveform::Sawtooth.sample(0.75), 0.5);
        // Approaches +1 just before the wrap
        assert!(Waveform::Sawtooth.sample(1.0 - 1e-6) > 0.99);
    }

    #[test]
    fn test_square_edges() {
        assert_eq!(Waveform::Square.sample(0.0), 1.0);
        assert_eq!(Waveform::Square.sample(0.49), 1.0);
        assert_eq!(Waveform::Square.sample(0.5), -1.0);
        assert_eq!(Waveform::Square.sample(0.99), -1.0);
    }

    #[test]
    fn test_triangle_shape() {
        assert_eq!(Waveform::Triangle.sample(0.0), -1.0);
        assert_eq!(Waveform::Triangle.sample(0.25), 0.0);
        // Peak at the midpoint
        assert_eq!(Waveform::Triangle.sample(0.5), 1.0);
        assert_eq!(Waveform::Triangle.sample(0.75), 0.0);
    }

    #[test]
    fn test_sine_at_zero() {
        assert!(Waveform::Sine.sample(0.0).abs() < 1e-6);
    }

    #[test]
    fn test_waveform_index_round_trip() {
        for i in 0..4 {
            assert_eq!(Waveform::from_index(i).index(), i);
        }
    }

    #[test]
    fn test_waveform_index_fallback() {
        assert_eq!(Waveform::from_index(4), Waveform::Sine);
        assert_eq!(Waveform::from_index(usize::MAX), Waveform::Sine);
    }

    #[test]
    fn test_oscillator_phase_wraps() {
        let mut osc = Oscillator::new(1.0, 4.0);

        // 1 Hz at 4 Hz sample rate: phase steps of 0.25
        osc.tick(Waveform::Sawtooth);
        assert!((osc.phase() - 0.25).abs() < 1e-6);
        osc.tick(Waveform::Sawtooth);
        osc.tick(Waveform::Sawtooth);
        osc.tick(Waveform::Sawtooth);
        // Wrapped back below 1.0
        assert!(osc.phase() < 1.0);
    }

    #[test]
    fn test_oscillator_frequency_change() {
        let mut osc = Oscillator::new(440.0, 44100.0);
        assert_eq!(osc.frequency(), 440.0);

        osc.set_frequency(880.0);
        assert_eq!(osc.frequency(), 880.0);
    }

    #[test]
    fn test_oscillator_reset() {
        let mut osc = Oscillator::new(440.0, 44100.0);
        for _ in 0..100 {
            osc.tick(Waveform::Sine);
        }
        osc.reset();
        assert_eq!(osc.phase(), 0.0);
    }
}
