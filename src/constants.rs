//! Protocol and actuator constants
//!
//! Timing values, buffer policy and the DRV-style coupling register layout
//! used while routing audio-band signal into the actuator.

/// Number of buffered chunks the refill tick tries to keep on hand.
///
/// The far end only ever sends a chunk after being asked, so this bounds the
/// memory held by the chunk buffer.
pub const TARGET_OCCUPANCY: usize = 5;

/// Refill tick period in milliseconds (flow-control cadence).
pub const REFILL_TICK_MS: u32 = 200;

/// Default playback tick period in milliseconds while audio-streaming.
///
/// In pattern mode the period is taken from the pattern's interval byte
/// instead.
pub const DEFAULT_PLAYBACK_TICK_MS: u32 = 10;

/// Maximum number of waveform library slots the driver chip exposes.
pub const MAX_WAVEFORM_SLOTS: usize = 8;

/// Upper bound on a single packet payload.
///
/// Wire lengths above this are treated as noise and discarded before any
/// allocation happens.
pub const MAX_PAYLOAD_LEN: usize = 64 * 1024;

/// Size of the fixed packet header (type + length, both little-endian i32).
pub const HEADER_LEN: usize = 8;

/// Actuator control register holding the AC-coupling bit.
pub const REG_AC_COUPLE: u8 = 0x1B;

/// Actuator control register selecting PWM/analog input routing.
pub const REG_PWM_ANALOG: u8 = 0x1D;

/// Value written to [`REG_AC_COUPLE`] while audio-streaming.
pub const AC_COUPLE_AUDIO: u8 = 0x20;

/// Value written to [`REG_PWM_ANALOG`] while audio-streaming.
pub const PWM_ANALOG_AUDIO: u8 = 0xA3;

/// SoundRequest kind asking the far end for the next chunk.
pub const SOUND_REQUEST_NEXT: i32 = 1;

/// SoundRequest kind that stops the audio stream.
pub const SOUND_REQUEST_STOP: i32 = 2;
