//! CLI interface for monotone

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use monotone::engine::DEFAULT_RELAY_PORT;

/// Monophonic MIDI synthesizer
#[derive(Parser)]
#[command(name = "monotone")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Force streaming mode (read MIDI from stdin even on a terminal)
    #[arg(long)]
    pub stdin: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render MIDI bytes from stdin to raw float32 PCM on stdout
    Render(RenderArgs),

    /// Play live on the default audio device, fed by UDP and MIDI inputs
    Play(PlayArgs),

    /// Record a triggered note to a WAV file
    Record(RecordArgs),

    /// List audio output devices and MIDI input ports
    Devices,
}

#[derive(Args)]
pub struct RenderArgs {
    /// Render length in seconds (default: run until stdin closes)
    #[arg(short, long)]
    pub duration: Option<f64>,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 44100)]
    pub sample_rate: u32,

    /// Samples per block
    #[arg(long, default_value_t = 512)]
    pub block_size: usize,

    /// Output channels (channel 0 duplicated)
    #[arg(long, default_value_t = 2)]
    pub channels: usize,

    /// Set a parameter, e.g. --param gain=0.5 (repeatable)
    #[arg(long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,

    /// Load parameters from a preset file
    #[arg(long)]
    pub preset: Option<PathBuf>,
}

impl Default for RenderArgs {
    fn default() -> Self {
        Self {
            duration: None,
            sample_rate: 44100,
            block_size: 512,
            channels: 2,
            params: Vec::new(),
            preset: None,
        }
    }
}

#[derive(Args)]
pub struct PlayArgs {
    /// UDP port for relayed MIDI
    #[arg(long, default_value_t = DEFAULT_RELAY_PORT)]
    pub port: u16,

    /// Set a parameter, e.g. --param waveform=2 (repeatable)
    #[arg(long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,

    /// Load parameters from a preset file
    #[arg(long)]
    pub preset: Option<PathBuf>,
}

impl Default for PlayArgs {
    fn default() -> Self {
        Self {
            port: DEFAULT_RELAY_PORT,
            params: Vec::new(),
            preset: None,
        }
    }
}

#[derive(Args)]
pub struct RecordArgs {
    /// Output WAV file path
    #[arg(short, long)]
    pub output: PathBuf,

    /// MIDI note to trigger (69 = A4)
    #[arg(short, long, default_value_t = 69)]
    pub note: u8,

    /// Held-note length in seconds (the release tail is appended)
    #[arg(short, long, default_value_t = 2.0)]
    pub duration: f64,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 44100)]
    pub sample_rate: u32,

    /// Output channels
    #[arg(long, default_value_t = 2)]
    pub channels: usize,

    /// Set a parameter, e.g. --param frequency=220 (repeatable)
    #[arg(long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,

    /// Load parameters from a preset file
    #[arg(long)]
    pub preset: Option<PathBuf>,
}
