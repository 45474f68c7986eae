//! Mock peripherals shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::buffer::AudioChunk;
use crate::driver::{DriveMode, SampleRenderer, WaveformDriver};
use crate::transport::Transport;
use crate::{HapticError, Result};

/// In-memory transport with shared inbound/outbound queues so tests keep a
/// probe handle after moving a clone into the controller.
#[derive(Clone, Default)]
pub struct MockTransport {
    inbound: Arc<Mutex<VecDeque<u8>>>,
    outbound: Arc<Mutex<Vec<u8>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&self, bytes: &[u8]) {
        self.inbound.lock().extend(bytes.iter().copied());
    }

    pub fn outbound(&self) -> Vec<u8> {
        self.outbound.lock().clone()
    }
}

impl Transport for MockTransport {
    fn available(&self) -> usize {
        self.inbound.lock().len()
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut inbound = self.inbound.lock();
        if inbound.len() < buf.len() {
            return Err(HapticError::TransportError("mock underrun".into()));
        }
        for slot in buf.iter_mut() {
            *slot = inbound.pop_front().unwrap();
        }
        Ok(())
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.outbound.lock().extend_from_slice(bytes);
        Ok(())
    }
}

/// One recorded call against the mock waveform driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    SetDriveMode(DriveMode),
    SetWaveform(usize, u8),
    SetRealtimeValue(u8),
    Trigger,
    Stop,
    WriteRegister(u8, u8),
}

/// Recording waveform driver with a small register file.
#[derive(Clone, Default)]
pub struct MockDriver {
    calls: Arc<Mutex<Vec<DriverCall>>>,
    registers: Arc<Mutex<[u8; 32]>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        self.calls.lock().clone()
    }

    pub fn register(&self, addr: u8) -> u8 {
        self.registers.lock()[addr as usize]
    }

    /// Preload a register without recording a call.
    pub fn set_register(&self, addr: u8, value: u8) {
        self.registers.lock()[addr as usize] = value;
    }
}

impl WaveformDriver for MockDriver {
    fn set_drive_mode(&mut self, mode: DriveMode) {
        self.calls.lock().push(DriverCall::SetDriveMode(mode));
    }

    fn set_waveform(&mut self, slot: usize, effect: u8) {
        self.calls.lock().push(DriverCall::SetWaveform(slot, effect));
    }

    fn set_realtime_value(&mut self, value: u8) {
        self.calls.lock().push(DriverCall::SetRealtimeValue(value));
    }

    fn trigger(&mut self) {
        self.calls.lock().push(DriverCall::Trigger);
    }

    fn stop(&mut self) {
        self.calls.lock().push(DriverCall::Stop);
    }

    fn read_register(&mut self, addr: u8) -> u8 {
        self.registers.lock()[addr as usize]
    }

    fn write_register(&mut self, addr: u8, value: u8) {
        self.registers.lock()[addr as usize] = value;
        self.calls.lock().push(DriverCall::WriteRegister(addr, value));
    }
}

#[derive(Default)]
struct RendererState {
    played: Vec<i32>,
    current: Option<Arc<AudioChunk>>,
    stops: usize,
}

/// Recording renderer; `finish_current` simulates the hardware completing
/// the chunk it was handed.
#[derive(Clone, Default)]
pub struct MockRenderer {
    state: Arc<Mutex<RendererState>>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chunk ids handed to the renderer, in order.
    pub fn played(&self) -> Vec<i32> {
        self.state.lock().played.clone()
    }

    pub fn stop_count(&self) -> usize {
        self.state.lock().stops
    }

    /// Mark the chunk currently being rendered as finished.
    pub fn finish_current(&self) {
        if let Some(chunk) = self.state.lock().current.take() {
            chunk.set_playing(false);
        }
    }
}

impl SampleRenderer for MockRenderer {
    fn play(&mut self, chunk: Arc<AudioChunk>) {
        let mut state = self.state.lock();
        state.played.push(chunk.chunk_id);
        state.current = Some(chunk);
    }

    fn stop_all(&mut self) {
        let mut state = self.state.lock();
        state.stops += 1;
        if let Some(chunk) = state.current.take() {
            chunk.set_playing(false);
        }
    }
}
