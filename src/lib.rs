//! monotone - Monophonic MIDI synthesizer
//!
//! A single-voice synthesis engine driven by raw MIDI bytes, with an
//! offline block renderer that speaks PCM over byte streams and a live
//! transport on the default audio device.

pub mod config;
pub mod engine;
pub mod midi;
pub mod params;
pub mod synth;

pub use engine::Processor;
pub use params::ParamStore;
pub use synth::VoiceEngine;
