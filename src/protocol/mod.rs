//! Wire protocol framing
//!
//! Every packet on the transport is `i32 type | i32 length | payload`, all
//! little-endian. The framer polls rather than blocks: with fewer than 8
//! bytes available it performs no read at all. A zero type or zero length is
//! treated as line noise and discarded without touching payload bytes; a
//! length outside sane bounds is likewise discarded before any allocation.
//!
//! Payload decoding into [`Command`]s lives in [`commands`].

pub mod commands;

pub use commands::{Command, PatternCommand, decode};

use crate::constants::{HEADER_LEN, MAX_PAYLOAD_LEN, SOUND_REQUEST_NEXT};
use crate::transport::Transport;
use crate::Result;

/// Packet type discriminants carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    /// Diagnostic echo packet.
    Test = 1,
    /// Status query (unused by the core).
    Status = 2,
    /// Waveform-library effect playback.
    Effect = 3,
    /// Pattern play/stop/resume.
    Pattern = 4,
    /// One chunk of streamed audio samples.
    Sound = 5,
    /// Stream control request (chunk pull / stop).
    SoundRequest = 6,
    /// Raw realtime drive value.
    Realtime = 7,
}

impl PacketType {
    /// Map a raw wire discriminant to a packet type, if known.
    pub fn from_i32(raw: i32) -> Option<Self> {
        match raw {
            1 => Some(PacketType::Test),
            2 => Some(PacketType::Status),
            3 => Some(PacketType::Effect),
            4 => Some(PacketType::Pattern),
            5 => Some(PacketType::Sound),
            6 => Some(PacketType::SoundRequest),
            7 => Some(PacketType::Realtime),
            _ => None,
        }
    }
}

/// A framed packet as read off the transport.
///
/// Transient: exists only between framing and dispatch.
#[derive(Debug, Clone)]
pub struct Packet {
    /// Raw wire type field (kept raw so unknown types can be reported).
    pub packet_type: i32,
    /// Payload bytes, exactly `length` of them.
    pub payload: Vec<u8>,
}

/// Poll the transport for one complete packet.
///
/// Returns `Ok(None)` when fewer than a header's worth of bytes is
/// available, or when the header was discarded as noise. Once a plausible
/// header has been read, the payload read blocks until all bytes arrive.
pub fn read_packet<T: Transport>(transport: &mut T) -> Result<Option<Packet>> {
    if transport.available() < HEADER_LEN {
        return Ok(None);
    }

    let mut header = [0u8; HEADER_LEN];
    transport.read_exact(&mut header)?;
    let packet_type = i32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let length = i32::from_le_bytes([header[4], header[5], header[6], header[7]]);

    // Lenient decode: a zero type or length is protocol noise, not an error.
    if packet_type == 0 || length == 0 {
        log::trace!("discarding header with zero type/length");
        return Ok(None);
    }
    if length < 0 || length as usize > MAX_PAYLOAD_LEN {
        log::warn!("discarding header with implausible length {length}");
        return Ok(None);
    }

    let mut payload = vec![0u8; length as usize];
    transport.read_exact(&mut payload)?;
    log::trace!("framed packet type {packet_type}, {length} byte payload");

    Ok(Some(Packet {
        packet_type,
        payload,
    }))
}

/// Encode the fixed 12-byte outbound chunk request.
///
/// `{type=6, length=4, payload=1}` — one of these is emitted per unit of
/// buffer deficit during the refill tick. Allocation-free so it is safe to
/// call from tick context.
pub fn encode_chunk_request() -> [u8; 12] {
    let mut packet = [0u8; 12];
    packet[0..4].copy_from_slice(&(PacketType::SoundRequest as i32).to_le_bytes());
    packet[4..8].copy_from_slice(&4i32.to_le_bytes());
    packet[8..12].copy_from_slice(&SOUND_REQUEST_NEXT.to_le_bytes());
    packet
}
