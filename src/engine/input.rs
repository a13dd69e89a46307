//! Hardware MIDI input
//!
//! Connects every available MIDI input port and feeds decoded events into
//! the same queue as the network relay. A port that fails to open is
//! logged and skipped; live playback works fine with zero ports.

use std::sync::mpsc::Sender;

use anyhow::Result;
use midir::{Ignore, MidiInput, MidiInputConnection};

use crate::midi::{self, MidiEvent};

/// Open connections to hardware MIDI input ports
pub struct MidiInputs {
    connections: Vec<MidiInputConnection<()>>,
}

impl MidiInputs {
    /// Connect all available input ports to the given event sender
    pub fn connect_all(sender: Sender<MidiEvent>) -> Result<Self> {
        let probe = MidiInput::new("monotone probe")?;
        let port_count = probe.ports().len();

        let mut connections = Vec::new();
        for index in 0..port_count {
            // Each connection consumes its own MidiInput instance
            let mut input = MidiInput::new("monotone input")?;
            input.ignore(Ignore::None);
            let ports = input.ports();
            let Some(port) = ports.get(index).cloned() else {
                continue;
            };
            let name = input
                .port_name(&port)
                .unwrap_or_else(|_| format!("port {}", index));

            let tx = sender.clone();
            match input.connect(
                &port,
                "monotone-input",
                move |_stamp, bytes, _| {
                    if let Some(event) = midi::decode_packet(bytes) {
                        let _ = tx.send(event);
                    }
                },
                (),
            ) {
                Ok(conn) => {
                    eprintln!("MIDI input connected: {}", name);
                    connections.push(conn);
                }
                Err(e) => {
                    eprintln!("Warning: failed to open MIDI input '{}': {}", name, e);
                }
            }
        }

        Ok(Self { connections })
    }

    /// Number of connected ports
    pub fn count(&self) -> usize {
        self.connections.len()
    }
}

/// List available MIDI input port names
pub fn list_input_ports() -> Result<Vec<String>> {
    let midi_in = MidiInput::new("monotone list")?;
    let ports = midi_in.ports();

    let names: Vec<String> = ports
        .iter()
        .filter_map(|p| midi_in.port_name(p).ok())
        .collect();

    Ok(names)
}
