//! Control core for a wireless haptic/audio output device
//!
//! `hapticlink` implements the mode arbitration engine and chunked audio
//! streaming pipeline of a device that drives a single vibration actuator
//! (and an audio output line) from a binary command protocol received over a
//! serial transport.
//!
//! # Features
//! - Length-prefixed packet framing with lenient header handling
//! - Mode arbitration among Idle / Effect / Pattern / Realtime / AudioStream
//! - Bounded chunk buffering with pull-based flow control over the transport
//! - Two periodic tick handles safe to drive from timer/interrupt context
//! - Deferred-action flags so teardown and allocation stay out of tick context
//!
//! # Architecture
//! The physical world is abstracted behind three traits: [`Transport`] (the
//! serial/Bluetooth byte stream), [`WaveformDriver`] (the haptic driver chip)
//! and [`SampleRenderer`] (the audio output path). The [`Controller`] owns
//! all mutable state and is polled from a cooperative main loop; the
//! [`RefillTick`] and [`PlaybackTick`] handles it hands out carry only the
//! minimal shared references a periodic timer callback needs.
//!
//! # Quick start
//! ```no_run
//! use hapticlink::Controller;
//! # use hapticlink::{DriveMode, SampleRenderer, Transport, WaveformDriver};
//! # struct Serial; struct Drv; struct Dac;
//! # impl Transport for Serial {
//! #     fn available(&self) -> usize { 0 }
//! #     fn read_exact(&mut self, _: &mut [u8]) -> hapticlink::Result<()> { Ok(()) }
//! #     fn write_all(&mut self, _: &[u8]) -> hapticlink::Result<()> { Ok(()) }
//! # }
//! # impl WaveformDriver for Drv {
//! #     fn set_drive_mode(&mut self, _: DriveMode) {}
//! #     fn set_waveform(&mut self, _: usize, _: u8) {}
//! #     fn set_realtime_value(&mut self, _: u8) {}
//! #     fn trigger(&mut self) {}
//! #     fn stop(&mut self) {}
//! #     fn read_register(&mut self, _: u8) -> u8 { 0 }
//! #     fn write_register(&mut self, _: u8, _: u8) {}
//! # }
//! # impl SampleRenderer for Dac {
//! #     fn play(&mut self, _: std::sync::Arc<hapticlink::AudioChunk>) {}
//! #     fn stop_all(&mut self) {}
//! # }
//! let mut controller = Controller::new(Serial, Drv, Dac);
//! let refill = controller.refill_tick();
//! let playback = controller.playback_tick();
//! // Wire `refill.fire()` / `playback.fire()` to two periodic timers, then:
//! loop {
//!     controller.poll().unwrap();
//! }
//! ```

#![warn(missing_docs)]

pub mod adapter;
pub mod buffer;
pub mod constants;
pub mod controller;
pub mod driver;
pub mod pattern;
pub mod protocol;
pub mod scheduler;
pub mod transport;

#[cfg(test)]
mod testutil;

/// Error types for control core operations
#[derive(thiserror::Error, Debug)]
pub enum HapticError {
    /// Error while decoding a packet payload
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Error reading from or writing to the transport
    #[error("Transport error: {0}")]
    TransportError(String),

    /// IO error from the underlying device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for HapticError {
    /// Converts a String into `HapticError::Other`.
    ///
    /// Convenience conversion for generic string errors. Prefer the specific
    /// variant constructors (`ParseError`, `TransportError`, `ConfigError`)
    /// when the failure category is known.
    fn from(msg: String) -> Self {
        HapticError::Other(msg)
    }
}

impl From<&str> for HapticError {
    /// Converts a string slice into `HapticError::Other`.
    ///
    /// See [`From<String>`] for guidance on when to use explicit variant
    /// constructors instead.
    fn from(msg: &str) -> Self {
        HapticError::Other(msg.to_string())
    }
}

/// Result type for control core operations
pub type Result<T> = std::result::Result<T, HapticError>;

// Public API exports
pub use adapter::DriverAdapter;
pub use buffer::{AudioChunk, ChunkBuffer};
pub use controller::{Controller, Mode};
pub use driver::{DriveMode, SampleRenderer, WaveformDriver};
pub use pattern::Pattern;
pub use protocol::{Command, Packet, PacketType, PatternCommand};
pub use scheduler::{DeferredFlags, PlaybackTick, RefillTick, SharedState, TickConfig};
pub use transport::Transport;
