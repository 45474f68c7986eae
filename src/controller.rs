//! Mode arbitration and command dispatch
//!
//! The [`Controller`] is the single point of truth for which mode owns the
//! actuator. It is driven from a cooperative main loop: each [`poll`]
//! iteration first drains deferred actions flagged by the ticks, then frames
//! and dispatches at most one inbound packet. All mode transitions, pattern
//! installs and buffer clears happen here — never in tick context.
//!
//! [`poll`]: Controller::poll

use std::sync::Arc;

use parking_lot::Mutex;

use crate::adapter::DriverAdapter;
use crate::buffer::{AudioChunk, ChunkBuffer};
use crate::constants::{DEFAULT_PLAYBACK_TICK_MS, MAX_WAVEFORM_SLOTS, SOUND_REQUEST_STOP};
use crate::driver::{SampleRenderer, WaveformDriver};
use crate::pattern::Pattern;
use crate::protocol::{self, Command, PatternCommand};
use crate::scheduler::{PlaybackTick, RefillTick, SharedState};
use crate::transport::Transport;
use crate::Result;

/// The mutually exclusive output modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    /// Nothing is driving the actuator.
    Idle = 0,
    /// A triggered waveform-library effect is playing.
    Effect = 1,
    /// An installed pattern drives the actuator via the playback tick.
    Pattern = 2,
    /// Raw values from the wire drive the actuator directly.
    Realtime = 3,
    /// Buffered audio chunks are coupled into the actuator.
    AudioStream = 4,
}

impl Mode {
    pub(crate) fn from_u8(raw: u8) -> Mode {
        match raw {
            1 => Mode::Effect,
            2 => Mode::Pattern,
            3 => Mode::Realtime,
            4 => Mode::AudioStream,
            _ => Mode::Idle,
        }
    }
}

/// The owning context for the whole control core.
///
/// Holds the transport, the driver adapter, the chunk buffer and the shared
/// tick state; hands out [`RefillTick`] / [`PlaybackTick`] handles carrying
/// only the references a timer callback needs.
pub struct Controller<T: Transport, D: WaveformDriver, R: SampleRenderer> {
    transport: Arc<Mutex<T>>,
    adapter: DriverAdapter<D, R>,
    buffer: Arc<Mutex<ChunkBuffer>>,
    shared: Arc<SharedState>,
    pattern: Option<Pattern>,
    current_sound: Option<i32>,
}

impl<T: Transport, D: WaveformDriver, R: SampleRenderer> Controller<T, D, R> {
    /// Create a controller in Idle mode with an empty chunk buffer.
    pub fn new(transport: T, driver: D, renderer: R) -> Self {
        Controller {
            transport: Arc::new(Mutex::new(transport)),
            adapter: DriverAdapter::new(driver, renderer),
            buffer: Arc::new(Mutex::new(ChunkBuffer::new())),
            shared: SharedState::new(),
            pattern: None,
            current_sound: None,
        }
    }

    /// Current output mode.
    pub fn mode(&self) -> Mode {
        self.shared.mode()
    }

    /// The installed pattern, if any.
    pub fn pattern(&self) -> Option<&Pattern> {
        self.pattern.as_ref()
    }

    /// Shared tick/flag state, for the embedding timer harness.
    pub fn shared(&self) -> Arc<SharedState> {
        Arc::clone(&self.shared)
    }

    /// Current chunk buffer occupancy.
    pub fn buffer_occupancy(&self) -> usize {
        self.buffer.lock().len()
    }

    /// Handle for the periodic flow-control tick.
    pub fn refill_tick(&self) -> RefillTick<T> {
        RefillTick::new(
            Arc::clone(&self.shared),
            Arc::clone(&self.buffer),
            Arc::clone(&self.transport),
        )
    }

    /// Handle for the periodic playback tick.
    pub fn playback_tick(&self) -> PlaybackTick<R> {
        PlaybackTick::new(
            Arc::clone(&self.shared),
            Arc::clone(&self.buffer),
            self.adapter.renderer_handle(),
        )
    }

    /// Run one cooperative loop iteration.
    ///
    /// Drains deferred tick actions, then polls the transport for at most
    /// one packet and dispatches it. Undecodable payloads are logged and
    /// dropped; transport errors propagate.
    pub fn poll(&mut self) -> Result<()> {
        self.drain_deferred();
        let packet = {
            let mut transport = self.transport.lock();
            protocol::read_packet(&mut *transport)?
        };
        if let Some(packet) = packet {
            match protocol::decode(&packet) {
                Ok(command) => self.dispatch(command),
                Err(err) => {
                    log::warn!("dropping packet type {}: {err}", packet.packet_type);
                }
            }
        }
        Ok(())
    }

    /// Act on deferred flags set by the ticks.
    ///
    /// This is the only place the AudioStream auto-exit and the pattern
    /// cursor write happen; both involve work that is off-limits in tick
    /// context.
    pub fn drain_deferred(&mut self) {
        if self.shared.flags.take_exit_audio() {
            self.exit_audio_stream();
        }
        if self.shared.flags.pattern_advance_pending() {
            if let Some(pattern) = self.pattern.as_mut() {
                if let Some(value) = pattern.advance() {
                    self.adapter.write_realtime_value(value);
                    self.shared.flags.clear_pattern_advance();
                }
            }
        }
    }

    /// Dispatch a decoded command into the mode state machine.
    pub fn dispatch(&mut self, command: Command) {
        match command {
            Command::Test { message } => log::info!("test packet: {message}"),
            Command::Status => {}
            Command::Effect { slots } => self.handle_effect(&slots),
            Command::Pattern(pattern) => self.handle_pattern(pattern),
            Command::Sound {
                sound_id,
                chunk_id,
                samples,
            } => self.handle_sound(sound_id, chunk_id, samples),
            Command::SoundRequest { kind } => self.handle_sound_request(kind),
            Command::Realtime { value } => self.handle_realtime(value),
            Command::Unknown { packet_type } => {
                log::debug!("ignoring unknown packet type {packet_type}");
            }
        }
    }

    fn handle_effect(&mut self, slots: &[u8]) {
        if slots.len() > MAX_WAVEFORM_SLOTS {
            log::warn!(
                "rejecting effect command with {} slots (max {MAX_WAVEFORM_SLOTS})",
                slots.len()
            );
            return;
        }
        self.adapter.configure_effect_mode();
        self.adapter.set_waveform_slots(slots);
        self.adapter.trigger();
        self.shared.set_mode(Mode::Effect);
        log::info!("playing {} waveform effect(s)", slots.len());
    }

    fn handle_pattern(&mut self, command: PatternCommand) {
        match command {
            PatternCommand::Play {
                interval_ms,
                values,
            } => {
                if self.shared.mode() == Mode::AudioStream {
                    self.exit_audio_stream();
                }
                log::info!(
                    "installing pattern ({} bytes, {interval_ms} ms tick)",
                    values.len()
                );
                self.pattern = Some(Pattern::new(interval_ms, values));
                self.shared.playback_tick.set_period_ms(interval_ms as u32);
                self.adapter.configure_realtime_mode();
                self.shared.set_mode(Mode::Pattern);
                self.shared.playback_tick.enable();
            }
            PatternCommand::Stop => {
                // Pattern data is retained; the mode stays dormant-Pattern.
                self.shared.playback_tick.disable();
                log::debug!("pattern playback stopped");
            }
            PatternCommand::Resume => {
                if self.pattern.is_none() {
                    log::debug!("pattern resume with no pattern installed");
                    return;
                }
                self.adapter.configure_realtime_mode();
                self.shared.set_mode(Mode::Pattern);
                self.shared.playback_tick.enable();
                log::debug!("pattern playback resumed");
            }
        }
    }

    fn handle_sound(&mut self, sound_id: i32, chunk_id: i32, samples: Vec<u8>) {
        if let Some(current) = self.current_sound {
            if current != sound_id {
                // The protocol does not flush on a stream change; surface it.
                log::warn!(
                    "chunk of sound {sound_id} appended while sound {current} is streaming"
                );
            }
        }
        log::debug!(
            "buffered chunk {chunk_id} of sound {sound_id} ({} bytes)",
            samples.len()
        );
        let front = {
            let mut buffer = self.buffer.lock();
            buffer.push(AudioChunk::new(sound_id, chunk_id, samples));
            buffer.front().map(Arc::clone)
        };

        if self.shared.mode() == Mode::AudioStream {
            return;
        }

        // First chunk of a session: only one mode may own the actuator, so
        // pattern and realtime bookkeeping go first.
        self.pattern = None;
        self.current_sound = Some(sound_id);
        self.shared
            .playback_tick
            .set_period_ms(DEFAULT_PLAYBACK_TICK_MS);
        self.adapter.configure_audio_mode();
        if let Some(chunk) = front {
            self.adapter.play_chunk(chunk);
        }
        self.shared.set_mode(Mode::AudioStream);
        self.shared.refill_tick.enable();
        self.shared.playback_tick.enable();
        log::info!("audio stream started (sound {sound_id})");
    }

    fn handle_sound_request(&mut self, kind: i32) {
        if kind == SOUND_REQUEST_STOP {
            self.exit_audio_stream();
        } else {
            log::debug!("ignoring sound request kind {kind}");
        }
    }

    fn handle_realtime(&mut self, value: u8) {
        if self.shared.mode() != Mode::Realtime {
            self.adapter.configure_realtime_mode();
            self.shared.set_mode(Mode::Realtime);
        }
        self.adapter.write_realtime_value(value);
    }

    /// The AudioStream → Idle teardown.
    ///
    /// Safe to call redundantly: on an already-idle controller the register
    /// restore and buffer clear are no-ops.
    fn exit_audio_stream(&mut self) {
        self.shared.refill_tick.disable();
        self.shared.playback_tick.disable();
        self.adapter.stop_all();
        self.adapter.restore_original_mode();
        self.shared.set_mode(Mode::Idle);
        self.current_sound = None;
        self.buffer.lock().clear();
        log::info!("audio stream stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{AC_COUPLE_AUDIO, REG_AC_COUPLE, REG_PWM_ANALOG};
    use crate::driver::DriveMode;
    use crate::testutil::{DriverCall, MockDriver, MockRenderer, MockTransport};

    struct Harness {
        controller: Controller<MockTransport, MockDriver, MockRenderer>,
        transport: MockTransport,
        driver: MockDriver,
        renderer: MockRenderer,
    }

    fn harness() -> Harness {
        let transport = MockTransport::new();
        let driver = MockDriver::new();
        let renderer = MockRenderer::new();
        let controller = Controller::new(transport.clone(), driver.clone(), renderer.clone());
        Harness {
            controller,
            transport,
            driver,
            renderer,
        }
    }

    fn sound_command(sound_id: i32, chunk_id: i32) -> Command {
        Command::Sound {
            sound_id,
            chunk_id,
            samples: vec![0; 32],
        }
    }

    #[test]
    fn test_effect_fills_and_zero_pads_slots() {
        let mut h = harness();
        h.controller.dispatch(Command::Effect {
            slots: vec![1, 2, 3],
        });

        assert_eq!(h.controller.mode(), Mode::Effect);
        let calls = h.driver.calls();
        assert!(calls.contains(&DriverCall::SetWaveform(2, 3)));
        assert!(calls.contains(&DriverCall::SetWaveform(7, 0)));
        assert!(calls.contains(&DriverCall::Trigger));
    }

    #[test]
    fn test_oversized_effect_rejected_without_driver_calls() {
        let mut h = harness();
        h.controller.dispatch(Command::Effect {
            slots: vec![1; 9],
        });

        assert_eq!(h.controller.mode(), Mode::Idle);
        assert!(h.driver.calls().is_empty());
    }

    #[test]
    fn test_pattern_play_installs_cursor_and_period() {
        let mut h = harness();
        h.controller.dispatch(Command::Pattern(PatternCommand::Play {
            interval_ms: 25,
            values: vec![10, 20, 30, 40],
        }));

        assert_eq!(h.controller.mode(), Mode::Pattern);
        assert_eq!(h.controller.pattern().unwrap().cursor(), 1);
        let shared = h.controller.shared();
        assert_eq!(shared.playback_tick.period_us(), 25_000);
        assert!(shared.playback_tick.is_enabled());
        assert!(
            h.driver
                .calls()
                .contains(&DriverCall::SetDriveMode(DriveMode::Realtime))
        );
    }

    #[test]
    fn test_pattern_stop_resume_preserves_cursor() {
        let mut h = harness();
        h.controller.dispatch(Command::Pattern(PatternCommand::Play {
            interval_ms: 10,
            values: vec![1, 2, 3, 4, 5, 6],
        }));

        // Two tick-flagged advances.
        for _ in 0..2 {
            h.controller.shared().flags.set_pattern_advance();
            h.controller.drain_deferred();
        }
        assert_eq!(h.controller.pattern().unwrap().cursor(), 5);

        h.controller
            .dispatch(Command::Pattern(PatternCommand::Stop));
        assert!(!h.controller.shared().playback_tick.is_enabled());

        h.controller
            .dispatch(Command::Pattern(PatternCommand::Resume));
        assert!(h.controller.shared().playback_tick.is_enabled());
        assert_eq!(h.controller.pattern().unwrap().cursor(), 5);
        assert_eq!(h.controller.mode(), Mode::Pattern);
    }

    #[test]
    fn test_pattern_resume_without_pattern_is_noop() {
        let mut h = harness();
        h.controller
            .dispatch(Command::Pattern(PatternCommand::Resume));

        assert_eq!(h.controller.mode(), Mode::Idle);
        assert!(!h.controller.shared().playback_tick.is_enabled());
        assert!(h.driver.calls().is_empty());
    }

    #[test]
    fn test_pattern_advance_writes_realtime_values() {
        let mut h = harness();
        h.controller.dispatch(Command::Pattern(PatternCommand::Play {
            interval_ms: 10,
            values: vec![1, 42, 3, 43],
        }));

        h.controller.shared().flags.set_pattern_advance();
        h.controller.drain_deferred();
        assert!(!h.controller.shared().flags.pattern_advance_pending());

        h.controller.shared().flags.set_pattern_advance();
        h.controller.drain_deferred();

        let calls = h.driver.calls();
        assert!(calls.contains(&DriverCall::SetRealtimeValue(42)));
        assert!(calls.contains(&DriverCall::SetRealtimeValue(43)));
    }

    #[test]
    fn test_sound_entry_tears_down_other_modes() {
        let mut h = harness();
        h.controller.dispatch(Command::Pattern(PatternCommand::Play {
            interval_ms: 10,
            values: vec![1, 2],
        }));
        h.controller.dispatch(Command::Realtime { value: 100 });

        h.controller.dispatch(sound_command(3, 0));

        assert_eq!(h.controller.mode(), Mode::AudioStream);
        assert!(h.controller.pattern().is_none());
        let shared = h.controller.shared();
        assert!(shared.refill_tick.is_enabled());
        assert!(shared.playback_tick.is_enabled());
        assert_eq!(shared.playback_tick.period_us(), 10_000);
        // First buffered chunk was handed to the renderer.
        assert_eq!(h.renderer.played(), vec![0]);
        assert_eq!(h.driver.register(REG_AC_COUPLE), AC_COUPLE_AUDIO);
    }

    #[test]
    fn test_second_chunk_does_not_restart_stream() {
        let mut h = harness();
        h.controller.dispatch(sound_command(3, 0));
        h.controller.dispatch(sound_command(3, 1));

        assert_eq!(h.controller.buffer_occupancy(), 2);
        // Only the first chunk goes straight to the renderer.
        assert_eq!(h.renderer.played(), vec![0]);
    }

    #[test]
    fn test_terminal_scenario_drains_to_idle() {
        let mut h = harness();
        h.driver.set_register(REG_AC_COUPLE, 0x55);
        h.driver.set_register(REG_PWM_ANALOG, 0x66);
        h.controller.dispatch(sound_command(3, 0));

        // Renderer finishes the only chunk.
        h.renderer.finish_current();
        h.controller.playback_tick().fire();
        assert!(h.controller.buffer_occupancy() == 0);

        h.controller.drain_deferred();

        assert_eq!(h.controller.mode(), Mode::Idle);
        assert_eq!(h.controller.buffer_occupancy(), 0);
        let shared = h.controller.shared();
        assert!(!shared.refill_tick.is_enabled());
        assert!(!shared.playback_tick.is_enabled());
        assert_eq!(h.renderer.stop_count(), 1);
        // Coupling registers restored to their pre-session values.
        assert_eq!(h.driver.register(REG_AC_COUPLE), 0x55);
        assert_eq!(h.driver.register(REG_PWM_ANALOG), 0x66);
    }

    #[test]
    fn test_stream_exit_is_idempotent() {
        let mut h = harness();
        h.controller.dispatch(sound_command(3, 0));
        h.controller.dispatch(Command::SoundRequest { kind: 2 });
        assert_eq!(h.controller.mode(), Mode::Idle);

        let writes_after_first = h.driver.calls().len();
        h.controller.dispatch(Command::SoundRequest { kind: 2 });

        assert_eq!(h.controller.mode(), Mode::Idle);
        // Second exit only re-issues the drive-mode switch; no register
        // writes from a stale snapshot.
        let extra: Vec<_> = h.driver.calls().split_off(writes_after_first);
        assert_eq!(
            extra,
            vec![DriverCall::SetDriveMode(DriveMode::InternalTrigger)]
        );
    }

    #[test]
    fn test_other_sound_request_kinds_ignored() {
        let mut h = harness();
        h.controller.dispatch(sound_command(3, 0));
        h.controller.dispatch(Command::SoundRequest { kind: 1 });
        assert_eq!(h.controller.mode(), Mode::AudioStream);
    }

    #[test]
    fn test_realtime_configures_drive_once() {
        let mut h = harness();
        h.controller.dispatch(Command::Realtime { value: 10 });
        h.controller.dispatch(Command::Realtime { value: 20 });

        assert_eq!(h.controller.mode(), Mode::Realtime);
        let mode_switches = h
            .driver
            .calls()
            .iter()
            .filter(|c| matches!(c, DriverCall::SetDriveMode(DriveMode::Realtime)))
            .count();
        assert_eq!(mode_switches, 1);
        assert!(h.driver.calls().contains(&DriverCall::SetRealtimeValue(20)));
    }

    #[test]
    fn test_cross_stream_chunk_appended_without_flush() {
        let mut h = harness();
        h.controller.dispatch(sound_command(3, 0));
        h.controller.dispatch(sound_command(4, 0));

        // Ambiguous upstream behavior kept as-is: no flush on soundId change.
        assert_eq!(h.controller.buffer_occupancy(), 2);
        assert_eq!(h.controller.mode(), Mode::AudioStream);
    }

    #[test]
    fn test_poll_propagates_no_error_on_quiet_transport() {
        let mut h = harness();
        h.controller.poll().unwrap();
        assert_eq!(h.controller.mode(), Mode::Idle);
        let _ = &h.transport;
    }
}
