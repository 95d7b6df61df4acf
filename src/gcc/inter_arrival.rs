//! Groups packets into send-time bursts and emits one delay sample per
//! completed group transition. Same burst-grouping shape as
//! `modules/remote_bitrate_estimator/inter_arrival`'s `SendTimeGroup`, but
//! owns the abs-send-time unwrap step itself (C1) instead of receiving
//! pre-unwrapped timestamps, and closes a group on a single span check
//! rather than a separate propagation-delta heuristic.

use super::abs_send_time;
use super::time::{TimeDelta, Timestamp};

/// Default span of send-time a burst may cover before the grouper treats
/// the next packet as the start of a new group.
pub const DEFAULT_BURST_THRESHOLD: TimeDelta = TimeDelta::from_millis(5);

/// One completed inter-arrival observation, emitted once per group
/// transition (never at the very first transition, since there is no
/// previous group to diff against).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelaySample {
    pub send_delta: TimeDelta,
    pub recv_delta: TimeDelta,
    pub size_delta: i64,
}

impl DelaySample {
    /// `recv_delta - send_delta`: zero on a stable link, positive while a
    /// queue grows, negative while it drains.
    pub fn propagation_delay_variation(&self) -> TimeDelta {
        self.recv_delta - self.send_delta
    }
}

#[derive(Debug, Clone, Copy)]
struct SendTimeGroup {
    size: i64,
    first_send_time_24: u32,
    last_send_time_24: u32,
    first_arrival: Timestamp,
    complete_time: Timestamp,
}

impl SendTimeGroup {
    fn new() -> Self {
        Self {
            size: 0,
            first_send_time_24: 0,
            last_send_time_24: 0,
            first_arrival: Timestamp::minus_infinity(),
            complete_time: Timestamp::minus_infinity(),
        }
    }

    fn is_first_packet(&self) -> bool {
        self.complete_time.is_infinite()
    }
}

/// Aggregates packets into send-time groups (C2 in the design).
pub struct InterArrival {
    burst_threshold: TimeDelta,
    current: SendTimeGroup,
    previous: SendTimeGroup,
}

impl InterArrival {
    pub fn new(burst_threshold: TimeDelta) -> Self {
        Self {
            burst_threshold,
            current: SendTimeGroup::new(),
            previous: SendTimeGroup::new(),
        }
    }

    /// Feeds one packet. Returns `Some(DelaySample)` exactly once per
    /// completed group transition; `None` while the current group is still
    /// open, or at the very first transition (no previous group to diff).
    pub fn add_packet(
        &mut self,
        send_time_24: u32,
        arrival_time: Timestamp,
        size: usize,
    ) -> Option<DelaySample> {
        if self.current.is_first_packet() {
            self.current.first_send_time_24 = send_time_24;
            self.current.last_send_time_24 = send_time_24;
            self.current.first_arrival = arrival_time;
            self.current.size = size as i64;
            self.current.complete_time = arrival_time;
            return None;
        }

        let span = abs_send_time::unwrap_duration(self.current.first_send_time_24, send_time_24);
        if span <= self.burst_threshold {
            // Extends the current burst. A `span` below zero means the
            // packet is reordered relative to the group's first packet; it
            // is still appended here without shifting `first_send_time`.
            self.current.last_send_time_24 = send_time_24;
            self.current.size += size as i64;
            self.current.complete_time = arrival_time;
            return None;
        }

        let sample = if self.previous.complete_time.is_finite() {
            let send_delta = abs_send_time::unwrap_duration(
                self.previous.last_send_time_24,
                self.current.last_send_time_24,
            );
            let recv_delta = self.current.complete_time - self.previous.complete_time;
            let size_delta = self.current.size - self.previous.size;
            Some(DelaySample {
                send_delta,
                recv_delta,
                size_delta,
            })
        } else {
            None
        };

        self.previous = self.current;
        self.current = SendTimeGroup {
            size: size as i64,
            first_send_time_24: send_time_24,
            last_send_time_24: send_time_24,
            first_arrival: arrival_time,
            complete_time: arrival_time,
        };

        sample
    }
}
