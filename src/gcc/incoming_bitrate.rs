//! Sliding-window byte counter producing a current received bitrate (C5).
//! Receive-side rather than the send-side pacer rate other bitrate
//! estimators typically track; shaped like this crate's other windowed
//! counters (fixed window, evict-then-sum on query).

use std::collections::VecDeque;

use super::data_rate::DataRate;
use super::time::{TimeDelta, Timestamp};

pub const DEFAULT_WINDOW: TimeDelta = TimeDelta::from_seconds(1);
const MIN_SPAN: TimeDelta = TimeDelta::from_millis(1);

struct Sample {
    arrival_time: Timestamp,
    bytes: i64,
}

/// C5: tracks recent `(arrival_time, bytes)` samples and reports the
/// current incoming bitrate over a trailing window.
pub struct IncomingBitrate {
    window: TimeDelta,
    samples: VecDeque<Sample>,
    sum_bytes: i64,
}

impl IncomingBitrate {
    pub fn new(window: TimeDelta) -> Self {
        Self {
            window,
            samples: VecDeque::new(),
            sum_bytes: 0,
        }
    }

    pub fn update(&mut self, size: usize, now: Timestamp) {
        self.samples.push_back(Sample {
            arrival_time: now,
            bytes: size as i64,
        });
        self.sum_bytes += size as i64;
        self.evict(now);
    }

    fn evict(&mut self, now: Timestamp) {
        while let Some(front) = self.samples.front() {
            if front.arrival_time < now - self.window {
                self.sum_bytes -= front.bytes;
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Returns `(bitrate, known)`. `known` is false when there are fewer
    /// than two samples, or the observed span is under a millisecond —
    /// too little data to trust rather than a noisy estimate.
    pub fn rate(&mut self, now: Timestamp) -> (DataRate, bool) {
        self.evict(now);
        if self.samples.len() < 2 {
            return (DataRate::zero(), false);
        }
        let oldest = self.samples.front().unwrap().arrival_time;
        let span = now - oldest;
        if span < MIN_SPAN {
            return (DataRate::zero(), false);
        }
        let rate = super::data_rate::DataSize::from_bytes(self.sum_bytes) / span;
        (rate, true)
    }
}

impl Default for IncomingBitrate {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
