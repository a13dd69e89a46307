//! Linear attack/release envelope
//!
//! A monophonic amplitude ramp driven by the note-on flag. The level climbs
//! toward 1.0 while a note is held and falls back toward 0.0 once it is
//! released, clamped to `[0, 1]` at both ends.

/// Attack increment per sample (~2.3 ms to full scale at 44.1 kHz).
const ATTACK_RATE: f32 = 0.01;

/// Release decrement per sample.
const RELEASE_RATE: f32 = 0.02;

/// Linear envelope tracker.
///
/// Ramp times scale with the sample rate; the rates are fixed per sample,
/// not normalized to wall-clock time.
pub struct Envelope {
    level: f32,
}

impl Envelope {
    /// Create a new envelope at zero level
    pub fn new() -> Self {
        Self { level: 0.0 }
    }

    /// Advance the envelope by one sample and return the new level.
    pub fn advance(&mut self, note_on: bool) -> f32 {
        if note_on {
            self.level = (self.level + ATTACK_RATE).min(1.0);
        } else {
            self.level = (self.level - RELEASE_RATE).max(0.0);
        }
        self.level
    }

    /// Get the current level without advancing
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Reset the level to zero
    pub fn reset(&mut self) {
        self.level = 0.0;
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_starts_at_zero() {
        let env = Envelope::new();
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn test_envelope_stays_in_range() {
        let mut env = Envelope::new();

        for _ in 0..500 {
            let level = env.advance(true);
            assert!((0.0..=1.0).contains(&level));
        }
        for _ in 0..500 {
            let level = env.advance(false);
            assert!((0.0..=1.0).contains(&level));
        }
    }

    #[test]
    fn test_envelope_full_attack() {
        let mut env = Envelope::new();

        // 100 on-samples at 0.01 per sample reach full scale
        for _ in 0..100 {
            env.advance(true);
        }
        assert!((env.level() - 1.0).abs() < 1e-5);

        // A few more samples and the clamp holds it at exactly 1.0
        for _ in 0..10 {
            env.advance(true);
        }
        assert_eq!(env.level(), 1.0);
    }

    #[test]
    fn test_envelope_full_release() {
        let mut env = Envelope::new();
        for _ in 0..200 {
            env.advance(true);
        }
        assert_eq!(env.level(), 1.0);

        // 50 off-samples at 0.02 per sample reach silence
        for _ in 0..50 {
            env.advance(false);
        }
        assert!(env.level() < 1e-6);

        for _ in 0..10 {
            env.advance(false);
        }
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn test_envelope_ramps_monotonically() {
        let mut env = Envelope::new();

        let mut prev = 0.0;
        for _ in 0..100 {
            let level = env.advance(true);
            assert!(level >= prev);
            prev = level;
        }

        for _ in 0..50 {
            let level = env.advance(false);
            assert!(level <= prev);
            prev = level;
        }
    }

    #[test]
    fn test_envelope_reset() {
        let mut env = Envelope::new();
        for _ in 0..50 {
            env.advance(true);
        }
        env.reset();
        assert_eq!(env.level(), 0.0);
    }
}
