//! Bounded-by-policy FIFO of decoded audio chunks
//!
//! The buffer itself is structurally unbounded; the refill tick's flow
//! control keeps occupancy at [`TARGET_OCCUPANCY`](crate::constants::TARGET_OCCUPANCY).
//! Structural mutation (push, clear) happens only on the cooperative loop;
//! the playback tick is limited to occupancy reads and popping the single
//! finished front chunk.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One unit of decoded audio sample data belonging to a stream.
///
/// Owned by the [`ChunkBuffer`]; the renderer holds a non-owning (shared)
/// reference for the duration of playback. The `playing` flag is set when the
/// chunk is handed to the renderer and cleared by the renderer once the
/// samples have been consumed.
#[derive(Debug)]
pub struct AudioChunk {
    /// Identifier of the stream this chunk belongs to.
    pub sound_id: i32,
    /// Position of this chunk within its stream.
    pub chunk_id: i32,
    samples: Vec<u8>,
    playing: AtomicBool,
}

impl AudioChunk {
    /// Create a chunk owning `samples`.
    pub fn new(sound_id: i32, chunk_id: i32, samples: Vec<u8>) -> Self {
        AudioChunk {
            sound_id,
            chunk_id,
            samples,
            playing: AtomicBool::new(false),
        }
    }

    /// Raw sample bytes.
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    /// Is the renderer currently consuming this chunk?
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    /// Mark the chunk as playing / finished.
    ///
    /// Set by the playback path when the chunk is handed to the renderer and
    /// cleared by the renderer when it is done.
    pub fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::Release);
    }
}

/// Ordered queue of [`AudioChunk`]s awaiting playback.
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    chunks: VecDeque<Arc<AudioChunk>>,
}

impl ChunkBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        ChunkBuffer {
            chunks: VecDeque::new(),
        }
    }

    /// Append a chunk; ownership transfers to the buffer.
    pub fn push(&mut self, chunk: AudioChunk) {
        self.chunks.push_back(Arc::new(chunk));
    }

    /// The oldest chunk, if any, without removing it.
    pub fn front(&self) -> Option<&Arc<AudioChunk>> {
        self.chunks.front()
    }

    /// Remove and drop the oldest chunk.
    pub fn pop(&mut self) {
        self.chunks.pop_front();
    }

    /// Drop every buffered chunk.
    ///
    /// Bulk deallocation: only ever invoked from the cooperative loop, never
    /// from tick context.
    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    /// Current occupancy. Allocation-free and tick-safe.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Is the buffer empty?
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
