//! Shared helpers for unit tests and benchmarks.

#![cfg(any(test, feature = "benchmark"))]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::clock::ClockSource;
use crate::codec::{FrameCodec, TextCodec};
use crate::types::Frame;

/// A [`ClockSource`] under test control.
///
/// Readings come from an internal counter that only moves when the test
/// says so — either explicitly via [`advance`](ManualClock::advance), or by
/// a fixed step applied after every read
/// ([`with_autostep`](ManualClock::with_autostep)), which makes successive
/// readings strictly increasing the way a real busy node's are.
#[derive(Debug)]
pub struct ManualClock {
    now: Arc<AtomicU32>,
    autostep: u32,
}

impl ManualClock {
    pub fn new(start_ms: u32) -> Self {
        Self { now: Arc::new(AtomicU32::new(start_ms)), autostep: 0 }
    }

    /// Advance the clock by `step` ms after every reading.
    pub fn with_autostep(mut self, step: u32) -> Self {
        self.autostep = step;
        self
    }

    /// Move the clock forward.
    pub fn advance(&self, ms: u32) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl ClockSource for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now.fetch_add(self.autostep, Ordering::SeqCst)
    }
}

/// A frame as a generator would mint it: no hop stamps.
pub fn sample_frame(sequence: u32, origin_ms: u32, payload: &[u8]) -> Frame {
    Frame::new(sequence, origin_ms, payload.to_vec())
}

/// Text-profile wire bytes for `frame`.
pub fn encode_text(frame: Frame) -> Vec<u8> {
    TextCodec::new().encode(&frame).expect("fixture frame must encode")
}
