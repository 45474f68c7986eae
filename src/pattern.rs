//! Vibration pattern storage and cursor management
//!
//! A pattern is the raw interleaved `(value, interval)` byte stream from a
//! Pattern-Play payload. The cursor starts at 1 and advances by 2 per
//! playback advance; advancing is always done from the cooperative loop, the
//! playback tick only flags that an advance is due.

/// An installed vibration pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    interval_ms: u8,
    values: Vec<u8>,
    cursor: usize,
}

impl Pattern {
    /// Install a pattern from its interval byte and raw interleaved bytes.
    pub fn new(interval_ms: u8, values: Vec<u8>) -> Self {
        Pattern {
            interval_ms,
            values,
            cursor: 1,
        }
    }

    /// Tick interval in milliseconds for this pattern.
    pub fn interval_ms(&self) -> u8 {
        self.interval_ms
    }

    /// Current cursor position into the raw bytes.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of raw pattern bytes.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Is the pattern empty?
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Has the cursor reached the end of the pattern?
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.values.len()
    }

    /// Yield the next drive value and advance the cursor by 2.
    ///
    /// Returns `None` once the cursor has reached the pattern length; the
    /// cursor is deliberately not reset so a later resume stays a no-op.
    pub fn advance(&mut self) -> Option<u8> {
        if self.cursor >= self.values.len() {
            return None;
        }
        let value = self.values[self.cursor];
        self.cursor += 2;
        Some(value)
    }
}
