//! monotone - Monophonic MIDI synthesizer

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use monotone::config;
use monotone::engine::{
    self, AudioBlock, MidiInputs, MidiRelay, Player, Processor, Recorder, RenderOptions,
};
use monotone::midi::MidiEvent;
use monotone::params::ParamStore;
use monotone::synth::VoiceEngine;

mod cli;

use cli::{Cli, Commands, PlayArgs, RecordArgs, RenderArgs};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Render(args)) => run_render(args),
        Some(Commands::Play(args)) => run_play(args),
        Some(Commands::Record(args)) => run_record(args),
        Some(Commands::Devices) => run_devices(),
        None => {
            // A piped stdin means a harness is driving us; a terminal
            // means a human wants live playback.
            if cli.stdin || !io::stdin().is_terminal() {
                run_render(RenderArgs::default())
            } else {
                run_play(PlayArgs::default())
            }
        }
    }
}

/// Build a parameter store from a preset file and `name=value` overrides
fn build_params(specs: &[String], preset: &Option<PathBuf>) -> Result<Arc<ParamStore>> {
    let params = Arc::new(ParamStore::new());

    if let Some(path) = preset {
        config::load_preset(path)?.apply(&params);
    }
    for spec in specs {
        let (name, value) = config::parse_param(spec)?;
        params.set_named(&name, value)?;
    }

    Ok(params)
}

fn run_render(args: RenderArgs) -> Result<()> {
    let params = build_params(&args.params, &args.preset)?;
    let mut voice = VoiceEngine::new(params);

    let options = RenderOptions {
        sample_rate: args.sample_rate,
        block_size: args.block_size,
        channels: args.channels,
        duration: args.duration,
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let stats = engine::render(&mut voice, &mut stdin.lock(), stdout.lock(), &options)?;

    eprintln!(
        "Rendered {} blocks, {} frames, {} MIDI events",
        stats.blocks_rendered, stats.frames_written, stats.events_applied
    );

    Ok(())
}

fn run_play(args: PlayArgs) -> Result<()> {
    let params = build_params(&args.params, &args.preset)?;
    let voice = VoiceEngine::new(params);

    let (sender, receiver) = mpsc::channel();

    let relay = MidiRelay::start(args.port, sender.clone())?;
    eprintln!("UDP MIDI relay listening on 127.0.0.1:{}", relay.port());

    let inputs = MidiInputs::connect_all(sender)?;
    if inputs.count() == 0 {
        eprintln!("No hardware MIDI inputs found");
    }

    let mut player = Player::new();
    player.start(Box::new(voice), receiver)?;
    if let Some(device) = engine::default_device_name() {
        eprintln!("Playing on: {}", device);
    }
    eprintln!("Send MIDI notes to play. Press Ctrl+C to exit.");

    let (stop_sender, stop_receiver) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = stop_sender.send(());
    })?;
    stop_receiver.recv()?;

    eprintln!("\nShutting down...");
    player.stop();
    drop(inputs);

    Ok(())
}

fn run_record(args: RecordArgs) -> Result<()> {
    let params = build_params(&args.params, &args.preset)?;
    let mut voice = VoiceEngine::new(params);

    let block_size = 512;
    voice.prepare(args.sample_rate as f32, block_size);

    let mut recorder = Recorder::new(&args.output, args.sample_rate, args.channels as u16)?;
    let mut block = AudioBlock::new(args.channels, block_size);

    voice.handle_event(MidiEvent::NoteOn {
        channel: 1,
        note: args.note,
        velocity: 1.0,
    });

    let total_frames = (args.duration * args.sample_rate as f64) as u64;
    let mut frames_written = 0u64;
    while frames_written < total_frames {
        block.clear();
        voice.render_block(&mut block);
        let frames = (total_frames - frames_written).min(block_size as u64) as usize;
        recorder.write_block(&block, frames)?;
        frames_written += frames as u64;
    }

    // Let the release tail finish before closing the file
    voice.handle_event(MidiEvent::NoteOff {
        channel: 1,
        note: args.note,
        velocity: 0.0,
    });
    loop {
        block.clear();
        voice.render_block(&mut block);
        recorder.write_block(&block, block_size)?;
        if block.peak() == 0.0 {
            break;
        }
    }

    eprintln!(
        "Recorded {:.2}s to {:?}",
        recorder.duration_secs(),
        args.output
    );
    recorder.finalize()?;

    Ok(())
}

fn run_devices() -> Result<()> {
    println!("Audio output devices:\n");

    if let Some(name) = engine::default_device_name() {
        println!("Default output: {}", name);
        println!();
    }

    let devices = engine::list_output_devices();
    if devices.is_empty() {
        println!("  (none found)");
    } else {
        for (name, config) in devices {
            println!("  - {} ({} Hz, {} ch)", name, config.sample_rate.0, config.channels);
        }
    }

    println!("\nMIDI input ports:");
    match engine::list_input_ports() {
        Ok(ports) if ports.is_empty() => println!("  (none found)"),
        Ok(ports) => {
            for port in ports {
                println!("  - {}", port);
            }
        }
        Err(e) => println!("  Error listing ports: {}", e),
    }

    Ok(())
}
