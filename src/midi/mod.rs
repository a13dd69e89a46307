//! MIDI byte codec
//!
//! Bidirectional mapping between raw status-byte-prefixed MIDI messages and
//! structured events. The decoder reads from any byte stream; a separate
//! fixed-size entry point serves the datagram relay.

use std::io::{ErrorKind, Read};

use thiserror::Error;

/// A structured MIDI event.
///
/// Channels are presented 1-based. Note velocities are scaled from the wire
/// range `0-127` into `[0, 1]` at this boundary; control values keep their
/// raw `0-127` range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MidiEvent {
    NoteOn { channel: u8, note: u8, velocity: f32 },
    NoteOff { channel: u8, note: u8, velocity: f32 },
    ControlChange { channel: u8, controller: u8, value: u8 },
}

/// Decode failure on the MIDI byte stream.
///
/// An unsupported status byte is fatal for the read: alignment cannot be
/// recovered without resynchronization, so callers must treat the stream as
/// ended rather than skip ahead.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unsupported MIDI status byte 0x{0:02X}")]
    UnsupportedStatus(u8),
    #[error("MIDI stream read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Read the next structured event from a byte stream.
///
/// Returns `Ok(None)` when no complete message is available: end of stream,
/// or a message truncated at end of input. Messages with no structured
/// representation (program change, channel pressure) are consumed to keep
/// the stream aligned and decoding continues with the next message.
pub fn read_event<R: Read>(reader: &mut R) -> Result<Option<MidiEvent>, DecodeError> {
    loop {
        let mut status = [0u8; 1];
        if !read_or_eof(reader, &mut status)? {
            return Ok(None);
        }
        let status = status[0];
        let channel = (status & 0x0F) + 1;

        match status & 0xF0 {
            0x80 | 0x90 | 0xB0 => {
                let mut data = [0u8; 2];
                if !read_or_eof(reader, &mut data)? {
                    return Ok(None);
                }
                let event = match status & 0xF0 {
                    0x90 => MidiEvent::NoteOn {
                        channel,
                        note: data[0],
                        velocity: data[1] as f32 / 127.0,
                    },
                    0x80 => MidiEvent::NoteOff {
                        channel,
                        note: data[0],
                        velocity: data[1] as f32 / 127.0,
                    },
                    _ => MidiEvent::ControlChange {
                        channel,
                        controller: data[0],
                        value: data[1],
                    },
                };
                return Ok(Some(event));
            }
            // One data byte, no structured event. Skip and keep reading.
            0xC0 | 0xD0 => {
                let mut data = [0u8; 1];
                if !read_or_eof(reader, &mut data)? {
                    return Ok(None);
                }
            }
            _ => return Err(DecodeError::UnsupportedStatus(status)),
        }
    }
}

/// Fill `buf` from the reader. Returns false on clean or mid-message EOF.
fn read_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool, DecodeError> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Decode a fixed 3-byte datagram payload.
///
/// Anything short, long, or outside the three supported message kinds
/// yields `None` (the relay drops such datagrams silently).
pub fn decode_packet(bytes: &[u8]) -> Option<MidiEvent> {
    if bytes.len() != 3 {
        return None;
    }
    let channel = (bytes[0] & 0x0F) + 1;
    match bytes[0] & 0xF0 {
        0x90 => Some(MidiEvent::NoteOn {
            channel,
            note: bytes[1],
            velocity: bytes[2] as f32 / 127.0,
        }),
        0x80 => Some(MidiEvent::NoteOff {
            channel,
            note: bytes[1],
            velocity: bytes[2] as f32 / 127.0,
        }),
        0xB0 => Some(MidiEvent::ControlChange {
            channel,
            controller: bytes[1],
            value: bytes[2],
        }),
        _ => None,
    }
}

/// Encode an event into exactly 3 raw MIDI bytes.
pub fn encode(event: MidiEvent) -> [u8; 3] {
    match event {
        MidiEvent::NoteOn {
            channel,
            note,
            velocity,
        } => [
            0x90 | (channel.saturating_sub(1) & 0x0F),
            note & 0x7F,
            (velocity.clamp(0.0, 1.0) * 127.0).round() as u8,
        ],
        MidiEvent::NoteOff {
            channel,
            note,
            velocity,
        } => [
            0x80 | (channel.saturating_sub(1) & 0x0F),
            note & 0x7F,
            (velocity.clamp(0.0, 1.0) * 127.0).round() as u8,
        ],
        MidiEvent::ControlChange {
            channel,
            controller,
            value,
        } => [
            0xB0 | (channel.saturating_sub(1) & 0x0F),
            controller & 0x7F,
            value & 0x7F,
        ],
    }
}
