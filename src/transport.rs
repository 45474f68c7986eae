//! Transport trait abstraction for the device's byte stream
//!
//! The physical link (serial, Bluetooth SPP, a test harness) only has to
//! report how many bytes are ready, hand over exactly N bytes on demand, and
//! accept outbound bytes. The framer polls [`Transport::available`] so the
//! cooperative loop never truly blocks.

use crate::Result;

/// Byte-oriented, half-duplex transport carrying the command protocol.
pub trait Transport: Send {
    /// Number of bytes that can be read without blocking.
    fn available(&self) -> usize;

    /// Read exactly `buf.len()` bytes, blocking until they arrive.
    ///
    /// A partially received packet stalls here until the remaining bytes
    /// show up; there is no timeout (known protocol gap).
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Write all of `bytes` to the far end.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;
}
