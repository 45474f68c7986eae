//! Tick configuration, deferred flags and the two periodic tick handles
//!
//! The embedding runtime owns two hardware/OS timers and calls
//! [`RefillTick::fire`] and [`PlaybackTick::fire`] at the periods published
//! in [`SharedState`]. Both handles obey a hard tick-context constraint: no
//! allocation, no deallocation (beyond dropping the single finished front
//! chunk), no blocking beyond a short mutex hold. Anything heavier — stream
//! teardown, pattern cursor writes — is flagged in [`DeferredFlags`] and
//! drained by the cooperative loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use parking_lot::Mutex;

use crate::buffer::ChunkBuffer;
use crate::constants::{DEFAULT_PLAYBACK_TICK_MS, REFILL_TICK_MS, TARGET_OCCUPANCY};
use crate::controller::Mode;
use crate::driver::SampleRenderer;
use crate::protocol::encode_chunk_request;
use crate::transport::Transport;

/// Period and enablement of one periodic tick.
///
/// Written by the cooperative loop, read by the embedding timer harness and
/// the tick itself. Disabling is the only cancellation primitive and takes
/// effect on the next fire.
#[derive(Debug)]
pub struct TickConfig {
    period_us: AtomicU32,
    enabled: AtomicBool,
}

impl TickConfig {
    fn new(period_ms: u32) -> Self {
        TickConfig {
            period_us: AtomicU32::new(period_ms.saturating_mul(1000)),
            enabled: AtomicBool::new(false),
        }
    }

    /// Reconfigure the period, given in milliseconds.
    pub fn set_period_ms(&self, period_ms: u32) {
        self.period_us
            .store(period_ms.saturating_mul(1000), Ordering::Release);
    }

    /// Current period in microseconds.
    pub fn period_us(&self) -> u32 {
        self.period_us.load(Ordering::Acquire)
    }

    /// Allow the tick to fire.
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    /// Stop the tick from firing.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    /// Is the tick currently enabled?
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}

/// Single-slot deferred actions, set from tick context and drained from the
/// cooperative loop.
#[derive(Debug, Default)]
pub struct DeferredFlags {
    exit_audio: AtomicBool,
    pattern_advance: AtomicBool,
}

impl DeferredFlags {
    /// Request the AudioStream teardown from tick context.
    pub fn request_exit_audio(&self) {
        self.exit_audio.store(true, Ordering::Release);
    }

    /// Consume an outstanding exit request, if any.
    pub fn take_exit_audio(&self) -> bool {
        self.exit_audio.swap(false, Ordering::AcqRel)
    }

    /// Flag that the pattern cursor is due to advance.
    pub fn set_pattern_advance(&self) {
        self.pattern_advance.store(true, Ordering::Release);
    }

    /// Is a pattern advance pending?
    pub fn pattern_advance_pending(&self) -> bool {
        self.pattern_advance.load(Ordering::Acquire)
    }

    /// Clear the pattern-advance flag after acting on it.
    pub fn clear_pattern_advance(&self) {
        self.pattern_advance.store(false, Ordering::Release);
    }
}

/// State crossing the tick/cooperative-loop boundary.
///
/// The mode value is written only by the cooperative loop; ticks read it to
/// decide their behavior. Everything here is atomic so ticks stay
/// allocation-free and lock-free on this surface.
#[derive(Debug)]
pub struct SharedState {
    mode: AtomicU8,
    /// Deferred actions flagged from tick context.
    pub flags: DeferredFlags,
    /// Refill (flow control) tick configuration.
    pub refill_tick: TickConfig,
    /// Playback advancement tick configuration.
    pub playback_tick: TickConfig,
}

impl SharedState {
    /// Fresh shared state: Idle, both ticks disabled at their default
    /// periods.
    pub fn new() -> Arc<Self> {
        Arc::new(SharedState {
            mode: AtomicU8::new(Mode::Idle as u8),
            flags: DeferredFlags::default(),
            refill_tick: TickConfig::new(REFILL_TICK_MS),
            playback_tick: TickConfig::new(DEFAULT_PLAYBACK_TICK_MS),
        })
    }

    /// Current output mode.
    pub fn mode(&self) -> Mode {
        Mode::from_u8(self.mode.load(Ordering::Acquire))
    }

    pub(crate) fn set_mode(&self, mode: Mode) {
        self.mode.store(mode as u8, Ordering::Release);
    }
}

/// Handle for the low-frequency flow-control tick.
///
/// No-op outside AudioStream. Computes the buffer deficit against
/// [`TARGET_OCCUPANCY`] and writes one fixed-size chunk request per missing
/// chunk, pacing the far end to the buffer's target occupancy.
pub struct RefillTick<T: Transport> {
    shared: Arc<SharedState>,
    buffer: Arc<Mutex<ChunkBuffer>>,
    transport: Arc<Mutex<T>>,
}

impl<T: Transport> RefillTick<T> {
    pub(crate) fn new(
        shared: Arc<SharedState>,
        buffer: Arc<Mutex<ChunkBuffer>>,
        transport: Arc<Mutex<T>>,
    ) -> Self {
        RefillTick {
            shared,
            buffer,
            transport,
        }
    }

    /// Run one refill tick.
    pub fn fire(&self) {
        if !self.shared.refill_tick.is_enabled() || self.shared.mode() != Mode::AudioStream {
            return;
        }
        let occupancy = self.buffer.lock().len();
        let deficit = TARGET_OCCUPANCY.saturating_sub(occupancy);
        if deficit == 0 {
            return;
        }
        let request = encode_chunk_request();
        let mut transport = self.transport.lock();
        for _ in 0..deficit {
            if let Err(err) = transport.write_all(&request) {
                log::warn!("chunk request write failed: {err}");
                return;
            }
        }
        log::debug!("requested {deficit} chunk(s), occupancy {occupancy}");
    }
}

impl<T: Transport> Clone for RefillTick<T> {
    fn clone(&self) -> Self {
        RefillTick {
            shared: Arc::clone(&self.shared),
            buffer: Arc::clone(&self.buffer),
            transport: Arc::clone(&self.transport),
        }
    }
}

/// Handle for the higher-frequency playback tick.
///
/// In AudioStream mode it pops the front chunk once the renderer has
/// finished it and hands the next one over, or defers the stream exit when
/// the buffer drains. In Pattern mode it only flags that the cursor is due
/// to advance; the write happens on the cooperative loop.
pub struct PlaybackTick<R: SampleRenderer> {
    shared: Arc<SharedState>,
    buffer: Arc<Mutex<ChunkBuffer>>,
    renderer: Arc<Mutex<R>>,
}

impl<R: SampleRenderer> PlaybackTick<R> {
    pub(crate) fn new(
        shared: Arc<SharedState>,
        buffer: Arc<Mutex<ChunkBuffer>>,
        renderer: Arc<Mutex<R>>,
    ) -> Self {
        PlaybackTick {
            shared,
            buffer,
            renderer,
        }
    }

    /// Run one playback tick.
    pub fn fire(&self) {
        if !self.shared.playback_tick.is_enabled() {
            return;
        }
        match self.shared.mode() {
            Mode::AudioStream => self.advance_stream(),
            Mode::Pattern => self.shared.flags.set_pattern_advance(),
            _ => {}
        }
    }

    fn advance_stream(&self) {
        let mut buffer = self.buffer.lock();
        let Some(front) = buffer.front() else {
            return;
        };
        if front.is_playing() {
            return;
        }
        // Renderer finished the front chunk.
        buffer.pop();
        let next = buffer.front().map(Arc::clone);
        drop(buffer);
        match next {
            Some(chunk) => {
                log::debug!("playing chunk {} of sound {}", chunk.chunk_id, chunk.sound_id);
                chunk.set_playing(true);
                self.renderer.lock().play(chunk);
            }
            None => {
                // Teardown deallocates; defer it to the cooperative loop.
                log::debug!("chunk buffer empty, deferring audio stream exit");
                self.shared.flags.request_exit_audio();
            }
        }
    }
}

impl<R: SampleRenderer> Clone for PlaybackTick<R> {
    fn clone(&self) -> Self {
        PlaybackTick {
            shared: Arc::clone(&self.shared),
            buffer: Arc::clone(&self.buffer),
            renderer: Arc::clone(&self.renderer),
        }
    }
}
