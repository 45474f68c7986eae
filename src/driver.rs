//! Driver trait abstractions for the actuator chip and audio renderer
//!
//! These traits are the boundary to the external peripherals: a DRV-style
//! haptic waveform driver (waveform library slots, trigger, drive-mode
//! switch, 8-bit register file) and the audio sample renderer feeding the
//! output line. Implementations may talk I2C/DAC hardware or be test mocks;
//! the core is generic over both.

use std::sync::Arc;

use crate::buffer::AudioChunk;

/// How the actuator is being driven right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveMode {
    /// Waveform-library playback started by an internal trigger command.
    InternalTrigger,
    /// Raw drive values written directly, bypassing the waveform library.
    Realtime,
    /// Audio-band signal coupled into the actuator.
    AudioCoupled,
}

/// Interface to the haptic waveform driver chip.
pub trait WaveformDriver: Send {
    /// Switch the chip's drive mode.
    fn set_drive_mode(&mut self, mode: DriveMode);

    /// Load a waveform library index into one of the chip's playback slots.
    fn set_waveform(&mut self, slot: usize, effect: u8);

    /// Write a raw realtime drive value.
    fn set_realtime_value(&mut self, value: u8);

    /// Start playback of the loaded waveform slots.
    fn trigger(&mut self);

    /// Stop any running waveform playback.
    fn stop(&mut self);

    /// Read an 8-bit control register.
    fn read_register(&mut self, addr: u8) -> u8;

    /// Write an 8-bit control register.
    fn write_register(&mut self, addr: u8, value: u8);
}

/// Interface to the audio sample renderer.
///
/// The renderer receives a shared reference to the chunk it is playing and
/// clears the chunk's `playing` flag once the samples have been consumed;
/// the playback tick watches that flag to know when to advance.
pub trait SampleRenderer: Send {
    /// Begin rendering the given chunk's samples.
    fn play(&mut self, chunk: Arc<AudioChunk>);

    /// Stop all rendering immediately.
    fn stop_all(&mut self);
}
