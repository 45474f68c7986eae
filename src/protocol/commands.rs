//! Packet payload decoding
//!
//! Turns a framed [`Packet`] into a typed [`Command`]. All multi-byte fields
//! are little-endian; every read is bounds-checked so a short payload comes
//! back as a [`HapticError::ParseError`] instead of a panic.

use super::{Packet, PacketType};
use crate::HapticError;
use crate::Result;

/// A decoded inbound command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Diagnostic echo with an embedded message.
    Test {
        /// The NUL-terminated diagnostic string, NUL stripped.
        message: String,
    },
    /// Status query; unused by the core.
    Status,
    /// Play up to 8 waveform-library effects.
    Effect {
        /// Waveform library indices, one per slot.
        slots: Vec<u8>,
    },
    /// Pattern lifecycle command.
    Pattern(PatternCommand),
    /// One chunk of streamed audio samples.
    Sound {
        /// Stream this chunk belongs to.
        sound_id: i32,
        /// Position within the stream.
        chunk_id: i32,
        /// Raw decoded sample bytes.
        samples: Vec<u8>,
    },
    /// Stream control request.
    SoundRequest {
        /// Request kind; only the stop kind acts.
        kind: i32,
    },
    /// Raw realtime drive value.
    Realtime {
        /// Drive value, already truncated to the actuator's 8-bit range.
        value: u8,
    },
    /// A packet type the core does not know; dispatched to a no-op.
    Unknown {
        /// The raw wire type field.
        packet_type: i32,
    },
}

/// The three pattern lifecycle verbs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternCommand {
    /// Install and start a new pattern.
    Play {
        /// Playback tick interval in milliseconds.
        interval_ms: u8,
        /// Raw interleaved `(value, interval)` bytes.
        values: Vec<u8>,
    },
    /// Pause pattern playback, keeping the pattern installed.
    Stop,
    /// Resume a previously stopped pattern.
    Resume,
}

/// Decode a framed packet into a [`Command`].
pub fn decode(packet: &Packet) -> Result<Command> {
    let Some(packet_type) = PacketType::from_i32(packet.packet_type) else {
        return Ok(Command::Unknown {
            packet_type: packet.packet_type,
        });
    };

    let data = packet.payload.as_slice();
    match packet_type {
        PacketType::Test => decode_test(data),
        PacketType::Status => Ok(Command::Status),
        PacketType::Effect => decode_effect(data),
        PacketType::Pattern => decode_pattern(data),
        PacketType::Sound => decode_sound(data),
        PacketType::SoundRequest => Ok(Command::SoundRequest {
            kind: read_i32(data, 0)?,
        }),
        PacketType::Realtime => decode_realtime(data),
    }
}

fn decode_test(data: &[u8]) -> Result<Command> {
    let length = non_negative(read_i32(data, 0)?, "test string length")?;
    let raw = read_bytes(data, 4, length)?;
    // Strip the NUL terminator and anything after it.
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    Ok(Command::Test {
        message: String::from_utf8_lossy(&raw[..end]).into_owned(),
    })
}

fn decode_effect(data: &[u8]) -> Result<Command> {
    let count = non_negative(read_i32(data, 0)?, "effect count")?;
    let slots = read_bytes(data, 4, count)?.to_vec();
    Ok(Command::Effect { slots })
}

fn decode_pattern(data: &[u8]) -> Result<Command> {
    let status = read_i32(data, 0)?;
    match status {
        1 => {
            let length = non_negative(read_i32(data, 4)?, "pattern length")?;
            let interval_ms = *data
                .get(8)
                .ok_or_else(|| HapticError::ParseError("pattern missing interval byte".into()))?;
            let values = read_bytes(data, 9, length)?.to_vec();
            Ok(Command::Pattern(PatternCommand::Play {
                interval_ms,
                values,
            }))
        }
        2 => Ok(Command::Pattern(PatternCommand::Stop)),
        3 => Ok(Command::Pattern(PatternCommand::Resume)),
        _ => Err(HapticError::ParseError(format!(
            "unknown pattern status {status}"
        ))),
    }
}

fn decode_sound(data: &[u8]) -> Result<Command> {
    let sound_id = read_i32(data, 0)?;
    let chunk_id = read_i32(data, 4)?;
    let sample_len = non_negative(read_i32(data, 8)?, "sample byte length")?;
    let samples = read_bytes(data, 12, sample_len)?.to_vec();
    Ok(Command::Sound {
        sound_id,
        chunk_id,
        samples,
    })
}

fn decode_realtime(data: &[u8]) -> Result<Command> {
    if data.len() < 2 {
        return Err(HapticError::ParseError(
            "realtime payload shorter than 2 bytes".into(),
        ));
    }
    let raw = i16::from_le_bytes([data[0], data[1]]);
    Ok(Command::Realtime { value: raw as u8 })
}

fn read_i32(data: &[u8], offset: usize) -> Result<i32> {
    if data.len() < offset + 4 {
        return Err(HapticError::ParseError(format!(
            "payload truncated at offset {offset}"
        )));
    }
    Ok(i32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ]))
}

fn read_bytes(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    let end = offset
        .checked_add(len)
        .ok_or_else(|| HapticError::ParseError("payload offset overflow".into()))?;
    if data.len() < end {
        return Err(HapticError::ParseError(format!(
            "payload shorter than declared ({} < {end})",
            data.len()
        )));
    }
    Ok(&data[offset..end])
}

fn non_negative(value: i32, what: &str) -> Result<usize> {
    if value < 0 {
        return Err(HapticError::ParseError(format!("negative {what}: {value}")));
    }
    Ok(value as usize)
}
