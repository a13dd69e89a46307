//! Preset loading and saving
//!
//! A preset is an opaque snapshot of the parameter values, stored as YAML.
//! Loading one back restores identical values; oscillator phase and
//! envelope state are not part of a snapshot.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::params::ParamStore;
use crate::synth::Waveform;

/// Snapshot of the synthesis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Oscillator frequency in Hz (default: 440)
    #[serde(default = "default_frequency")]
    pub frequency: f32,

    /// Output gain 0.0-1.0 (default: 0.7)
    #[serde(default = "default_gain")]
    pub gain: f32,

    /// Selected waveform (default: sine)
    #[serde(default = "default_waveform")]
    pub waveform: Waveform,
}

fn default_frequency() -> f32 {
    440.0
}
fn default_gain() -> f32 {
    0.7
}
fn default_waveform() -> Waveform {
    Waveform::Sine
}

impl Default for Preset {
    fn default() -> Self {
        Self {
            frequency: default_frequency(),
            gain: default_gain(),
            waveform: default_waveform(),
        }
    }
}

impl Preset {
    /// Snapshot the current values of a parameter store
    pub fn capture(params: &ParamStore) -> Self {
        Self {
            frequency: params.frequency(),
            gain: params.gain(),
            waveform: params.waveform(),
        }
    }

    /// Apply this preset to a parameter store. Values pass through the
    /// store's clamping.
    pub fn apply(&self, params: &ParamStore) {
        params.set_frequency(self.frequency);
        params.set_gain(self.gain);
        params.set_waveform(self.waveform);
    }
}

/// Load a preset from a YAML file
pub fn load_preset(path: &Path) -> Result<Preset> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read preset: {:?}", path))?;
    let preset: Preset = serde_yaml::from_str(&contents)
        .with_context(|| format!("failed to parse preset: {:?}", path))?;
    Ok(preset)
}

/// Save a preset to a YAML file
pub fn save_preset(path: &Path, preset: &Preset) -> Result<()> {
    let yaml = serde_yaml::to_string(preset).context("failed to serialize preset")?;
    std::fs::write(path, yaml).with_context(|| format!("failed to write preset: {:?}", path))?;
    Ok(())
}

/// Parse a `name=value` parameter pair from the command line
pub fn parse_param(spec: &str) -> Result<(String, f32)> {
    let (name, value) = spec
        .split_once('=')
        .ok_or_else(|| anyhow!("expected name=value, got '{}'", spec))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("expected name=value, got '{}'", spec));
    }
    let value: f32 = value
        .trim()
        .parse()
        .with_context(|| format!("invalid value for parameter '{}'", name))?;
    Ok((name.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_preset_round_trip() {
        let params = ParamStore::new();
        params.set_frequency(523.25);
        params.set_gain(0.4);
        params.set_waveform(Waveform::Triangle);

        let file = NamedTempFile::new().unwrap();
        save_preset(file.path(), &Preset::capture(&params)).unwrap();

        let restored = ParamStore::new();
        load_preset(file.path()).unwrap().apply(&restored);

        assert_eq!(restored.frequency(), 523.25);
        assert_eq!(restored.gain(), 0.4);
        assert_eq!(restored.waveform(), Waveform::Triangle);
    }

    #[test]
    fn test_partial_preset_uses_defaults() {
        let preset: Preset = serde_yaml::from_str("gain: 0.5").unwrap();
        assert_eq!(preset.frequency, 440.0);
        assert_eq!(preset.gain, 0.5);
        assert_eq!(preset.waveform, Waveform::Sine);
    }

    #[test]
    fn test_waveform_names() {
        let preset: Preset = serde_yaml::from_str("waveform: sawtooth").unwrap();
        assert_eq!(preset.waveform, Waveform::Sawtooth);
    }

    #[test]
    fn test_apply_clamps_out_of_range() {
        let preset = Preset {
            frequency: 50000.0,
            gain: 2.0,
            waveform: Waveform::Square,
        };
        let params = ParamStore::new();
        preset.apply(&params);

        assert_eq!(params.frequency(), 20000.0);
        assert_eq!(params.gain(), 1.0);
        assert_eq!(params.waveform(), Waveform::Square);
    }

    #[test]
    fn test_invalid_preset_file() {
        let mut file = NamedTempFile::new().unwrap();
        use std::io::Write;
        file.write_all(b"waveform: [not, a, waveform]").unwrap();

        assert!(load_preset(file.path()).is_err());
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(parse_param("gain=0.5").unwrap(), ("gain".to_string(), 0.5));
        assert_eq!(
            parse_param("frequency = 220").unwrap(),
            ("frequency".to_string(), 220.0)
        );
    }

    #[test]
    fn test_parse_param_rejects_garbage() {
        assert!(parse_param("gain").is_err());
        assert!(parse_param("=0.5").is_err());
        assert!(parse_param("gain=loud").is_err());
    }
}
