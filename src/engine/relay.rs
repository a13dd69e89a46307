//! Network MIDI relay
//!
//! Listens for fixed 3-byte MIDI messages on a local UDP port and hands the
//! decoded events to the queue the audio callback drains. Malformed or
//! short datagrams are dropped without comment.

use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::midi::{self, MidiEvent};

/// Well-known local port for relayed MIDI
pub const DEFAULT_RELAY_PORT: u16 = 9999;

/// UDP MIDI receiver thread
pub struct MidiRelay {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    port: u16,
}

impl MidiRelay {
    /// Bind 127.0.0.1 on the given port (0 picks an ephemeral port) and
    /// start forwarding decoded events to the sender.
    pub fn start(port: u16, sender: Sender<MidiEvent>) -> Result<Self> {
        let socket = UdpSocket::bind(("127.0.0.1", port))
            .with_context(|| format!("failed to bind UDP port {}", port))?;
        let port = socket.local_addr()?.port();

        // Timeout keeps the thread responsive to stop()
        socket
            .set_read_timeout(Some(Duration::from_millis(100)))
            .context("failed to configure relay socket")?;

        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();

        let handle = thread::spawn(move || {
            let mut buf = [0u8; 8];
            while flag.load(Ordering::SeqCst) {
                match socket.recv_from(&mut buf) {
                    Ok((len, _)) => {
                        if let Some(event) = midi::decode_packet(&buf[..len]) {
                            if sender.send(event).is_err() {
                                break;
                            }
                        }
                    }
                    // Timeouts and transient errors: keep listening
                    Err(_) => {}
                }
            }
        });

        Ok(Self {
            running,
            handle: Some(handle),
            port,
        })
    }

    /// The port the relay is actually bound to
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Stop the receiver thread and wait for it to exit
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MidiRelay {
    fn drop(&mut self) {
        self.stop();
    }
}
