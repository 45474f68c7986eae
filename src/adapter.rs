//! Thin control surface over the waveform driver and sample renderer
//!
//! Owns the drive-mode switching and the coupling-register save/restore that
//! brackets an audio-stream session. The snapshot is taken exactly once per
//! session (first chunk in) and written back once (stream exit), so repeated
//! sessions cannot drift the registers.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::buffer::AudioChunk;
use crate::constants::{
    AC_COUPLE_AUDIO, MAX_WAVEFORM_SLOTS, PWM_ANALOG_AUDIO, REG_AC_COUPLE, REG_PWM_ANALOG,
};
use crate::driver::{DriveMode, SampleRenderer, WaveformDriver};

/// Pre-audio values of the two coupling registers.
#[derive(Debug, Clone, Copy)]
struct CouplingSnapshot {
    ac_couple: u8,
    pwm_analog: u8,
}

/// Control surface combining a [`WaveformDriver`] and a [`SampleRenderer`].
pub struct DriverAdapter<D: WaveformDriver, R: SampleRenderer> {
    driver: D,
    renderer: Arc<Mutex<R>>,
    saved: Option<CouplingSnapshot>,
}

impl<D: WaveformDriver, R: SampleRenderer> DriverAdapter<D, R> {
    /// Wrap a driver and renderer.
    pub fn new(driver: D, renderer: R) -> Self {
        DriverAdapter {
            driver,
            renderer: Arc::new(Mutex::new(renderer)),
            saved: None,
        }
    }

    /// Shared handle to the renderer, for the playback tick.
    pub fn renderer_handle(&self) -> Arc<Mutex<R>> {
        Arc::clone(&self.renderer)
    }

    /// Put the actuator into triggered waveform-library mode.
    pub fn configure_effect_mode(&mut self) {
        self.driver.set_drive_mode(DriveMode::InternalTrigger);
    }

    /// Put the actuator into realtime-drive mode.
    pub fn configure_realtime_mode(&mut self) {
        self.driver.set_drive_mode(DriveMode::Realtime);
    }

    /// Put the actuator into audio-coupled mode.
    ///
    /// Snapshots the two coupling registers before overwriting them; the
    /// snapshot is taken at most once per stream session, so calling this
    /// again before [`restore_original_mode`](Self::restore_original_mode)
    /// does not capture the already-overwritten values.
    pub fn configure_audio_mode(&mut self) {
        if self.saved.is_none() {
            self.saved = Some(CouplingSnapshot {
                ac_couple: self.driver.read_register(REG_AC_COUPLE),
                pwm_analog: self.driver.read_register(REG_PWM_ANALOG),
            });
        }
        self.driver.set_drive_mode(DriveMode::AudioCoupled);
        self.driver.write_register(REG_AC_COUPLE, AC_COUPLE_AUDIO);
        self.driver.write_register(REG_PWM_ANALOG, PWM_ANALOG_AUDIO);
    }

    /// Leave audio-coupled mode, restoring the snapshotted registers.
    ///
    /// Idempotent: with no snapshot outstanding only the drive-mode switch
    /// is performed.
    pub fn restore_original_mode(&mut self) {
        self.driver.set_drive_mode(DriveMode::InternalTrigger);
        if let Some(saved) = self.saved.take() {
            self.driver.write_register(REG_AC_COUPLE, saved.ac_couple);
            self.driver.write_register(REG_PWM_ANALOG, saved.pwm_analog);
        }
    }

    /// Write a raw realtime drive value.
    pub fn write_realtime_value(&mut self, value: u8) {
        self.driver.set_realtime_value(value);
    }

    /// Stop the actuator and load up to 8 waveform slots, zero-filling the
    /// unused ones.
    ///
    /// Callers validate the slot count; the arbiter rejects oversized effect
    /// commands before reaching this point.
    pub fn set_waveform_slots(&mut self, values: &[u8]) {
        debug_assert!(values.len() <= MAX_WAVEFORM_SLOTS);
        self.driver.stop();
        for (slot, value) in values.iter().enumerate() {
            self.driver.set_waveform(slot, *value);
        }
        for slot in values.len()..MAX_WAVEFORM_SLOTS {
            self.driver.set_waveform(slot, 0);
        }
    }

    /// Start playback of the loaded waveform slots.
    pub fn trigger(&mut self) {
        self.driver.trigger();
    }

    /// Hand a chunk to the renderer, marking it as playing.
    pub fn play_chunk(&self, chunk: Arc<AudioChunk>) {
        chunk.set_playing(true);
        self.renderer.lock().play(chunk);
    }

    /// Stop all audio rendering.
    pub fn stop_all(&mut self) {
        self.renderer.lock().stop_all();
    }
}
