// SPDX-License-Identifier: GPL-3.0-only

//! Shared frame storage with tear-free snapshots
//!
//! Each stream has exactly one writer (the capture thread) and any number
//! of reader threads. Buffer, timestamp, and sequence counter live behind a
//! single mutex held only for the duration of one buffer copy, so a reader
//! never observes bytes from two different samples and the writer is never
//! blocked longer than one copy.

use std::sync::{Arc, Mutex};

/// Fixed shape of a stream's pixel buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamShape {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
}

impl StreamShape {
    /// Byte length of one frame with this shape (row-major, interleaved)
    pub const fn byte_len(&self) -> usize {
        (self.width * self.height * self.channels) as usize
    }
}

/// A tear-free copy of the latest frame
///
/// Before the first sample of a stream arrives (or before its node is
/// configured at all), `data` is zero-filled at the stream's fixed shape.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub data: Vec<u8>,
    pub shape: StreamShape,
}

/// Guarded per-stream state. The buffer exists only while the stream's
/// node is configured; it never changes length once allocated.
#[derive(Debug)]
struct StreamState {
    buffer: Option<Vec<u8>>,
    timestamp_ms: u64,
    /// Sequence stamp of the latest accepted sample, 0-based
    sequence: u64,
    /// Count of accepted samples since allocation
    samples: u64,
}

/// Handle to one stream's shared frame state
///
/// Cloning is cheap; all clones refer to the same state.
#[derive(Debug, Clone)]
pub struct SharedStream {
    shape: StreamShape,
    state: Arc<Mutex<StreamState>>,
}

impl SharedStream {
    pub fn new(shape: StreamShape) -> Self {
        Self {
            shape,
            state: Arc::new(Mutex::new(StreamState {
                buffer: None,
                timestamp_ms: 0,
                sequence: 0,
                samples: 0,
            })),
        }
    }

    pub fn shape(&self) -> StreamShape {
        self.shape
    }

    /// Allocate the zero-filled frame buffer. Idempotent: a second call
    /// while allocated leaves the existing buffer and counters untouched.
    pub fn allocate(&self) {
        let mut state = self.state.lock().unwrap();
        if state.buffer.is_none() {
            state.buffer = Some(vec![0u8; self.shape.byte_len()]);
        }
    }

    pub fn is_allocated(&self) -> bool {
        self.state.lock().unwrap().buffer.is_some()
    }

    /// Overwrite the buffer with one converted sample and advance the
    /// sequence counter and timestamp.
    ///
    /// Returns false (sample dropped) if no buffer is allocated, which is
    /// the case for an unconfigured stream or one whose configuration
    /// failed. `bytes` must match the stream's byte length.
    pub fn publish(&self, bytes: &[u8], timestamp_ms: u64) -> bool {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        match state.buffer {
            Some(ref mut buffer) => {
                buffer.copy_from_slice(bytes);
                state.sequence = state.samples;
                state.samples += 1;
                state.timestamp_ms = timestamp_ms;
                true
            }
            None => false,
        }
    }

    /// Copy out the latest frame; zero-filled if nothing has arrived yet
    pub fn snapshot(&self) -> FrameSnapshot {
        let state = self.state.lock().unwrap();
        let data = match state.buffer {
            Some(ref buffer) => buffer.clone(),
            None => vec![0u8; self.shape.byte_len()],
        };
        FrameSnapshot {
            data,
            shape: self.shape,
        }
    }

    /// Capture timestamp of the latest sample in milliseconds, 0 before
    /// the first sample
    pub fn last_timestamp_ms(&self) -> u64 {
        self.state.lock().unwrap().timestamp_ms
    }

    /// Sequence stamp of the latest sample, 0 before the first sample
    pub fn last_sequence(&self) -> u64 {
        self.state.lock().unwrap().sequence
    }

    /// Free the buffer and reset counters to the pre-sample state.
    /// Called on session stop; node disconnect alone does not release.
    pub fn release(&self) {
        let mut state = self.state.lock().unwrap();
        state.buffer = None;
        state.timestamp_ms = 0;
        state.sequence = 0;
        state.samples = 0;
    }
}
