//! Public facade (C8): wires C1–C7 together and tracks which SSRCs are
//! currently active. `DelayBasedBwe` plays the same wiring role upstream
//! but keeps separate audio/video detector instances and a
//! `NetworkStatePredictor` hook; this facade runs a single detector per
//! instance (per-media-type separation is out of scope) and supports two
//! independent external callers: an ingest path calling `on_packet`, and a
//! feedback path calling `maybe_emit_feedback` on its own timer.
//!
//! Neither entry point reads a clock itself — `on_packet` takes its `now`
//! from the observation's `arrival_time` and `maybe_emit_feedback` takes
//! an explicit `now` — so the only monotonic clock read anywhere in this
//! crate happens in the caller, via [`super::clock`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use log::{debug, warn};

use super::aimd_rate_control::{AimdRateControl, AimdRateControlConfig};
use super::config::EstimatorConfig;
use super::data_rate::DataRate;
use super::delay_based_filter::DelayBasedFilter;
use super::incoming_bitrate::IncomingBitrate;
use super::inter_arrival::InterArrival;
use super::overuse_detector::{OveruseDetector, OveruseDetectorConfig};
use super::remb::{RembPacket, RembScheduler};
use super::time::Timestamp;

/// One arriving packet as handed to the estimator by the RTP layer.
#[derive(Debug, Clone, Copy)]
pub struct PacketObservation {
    pub arrival_time: Timestamp,
    pub send_time_24: u32,
    pub size: usize,
    pub ssrc: u32,
}

struct IngestState {
    active_ssrcs: HashMap<u32, Timestamp>,
    inter_arrival: InterArrival,
    filter: DelayBasedFilter,
    overuse: OveruseDetector,
    incoming_rate: IncomingBitrate,
    rate_control: AimdRateControl,
    remb: RembScheduler,
}

impl IngestState {
    fn new(config: &EstimatorConfig) -> Self {
        Self {
            active_ssrcs: HashMap::new(),
            inter_arrival: InterArrival::new(config.burst_threshold),
            filter: DelayBasedFilter::new(config.filter_variant, config.kalman_q),
            overuse: OveruseDetector::new(OveruseDetectorConfig {
                overuse_time_threshold: config.overuse_time_threshold,
                k_up: config.k_u,
                k_down: config.k_d,
                threshold_min: config.threshold_min,
                threshold_max: config.threshold_max,
            }),
            incoming_rate: IncomingBitrate::new(config.rate_window),
            rate_control: AimdRateControl::new(AimdRateControlConfig {
                min_bitrate: config.min_bitrate,
                max_bitrate: config.max_bitrate,
                initial_bitrate: config.initial_bitrate,
                beta: config.beta,
            }),
            remb: RembScheduler::new(
                config.remb_interval,
                config.remb_decrease_threshold,
                config.sender_ssrc,
            ),
        }
    }
}

/// C8: tracks active SSRCs and the current bandwidth estimate, safe for
/// one ingest-path caller and one feedback-path caller to share.
pub struct Estimator {
    config: EstimatorConfig,
    state: Mutex<IngestState>,
    current_estimate_bps: AtomicI64,
    last_packet_time_us: AtomicI64,
    closed: AtomicBool,
}

impl Estimator {
    pub fn new(config: EstimatorConfig) -> Self {
        let initial_bps = config.initial_bitrate.bps();
        let state = IngestState::new(&config);
        Self {
            config,
            state: Mutex::new(state),
            current_estimate_bps: AtomicI64::new(initial_bps),
            last_packet_time_us: AtomicI64::new(Timestamp::minus_infinity().us()),
            closed: AtomicBool::new(false),
        }
    }

    /// Feeds one packet observation through C1–C6. Returns the
    /// post-update estimate. A no-op after `close()`.
    pub fn on_packet(&self, obs: PacketObservation) -> DataRate {
        if self.closed.load(Ordering::Acquire) {
            return self.estimate();
        }

        let now = obs.arrival_time;
        let mut state = self.state.lock().unwrap();

        state.active_ssrcs.insert(obs.ssrc, now);
        self.sweep_expired(&mut state, now);

        state.incoming_rate.update(obs.size, now);

        if let Some(sample) = state
            .inter_arrival
            .add_packet(obs.send_time_24, now, obs.size)
        {
            let gradient_ms = state.filter.update(sample, now);
            let num_deltas = state.filter.num_deltas();
            let usage = state.overuse.detect(gradient_ms, now, num_deltas);
            let (rate, known) = state.incoming_rate.rate(now);
            let incoming_rate = known.then_some(rate);
            let estimate = state.rate_control.update(usage, incoming_rate, now);
            debug!("gcc: usage={usage:?} gradient_ms={gradient_ms:.3} estimate={estimate}");
            self.current_estimate_bps
                .store(estimate.bps(), Ordering::Release);
        }

        self.last_packet_time_us.store(now.us(), Ordering::Release);
        self.estimate()
    }

    fn sweep_expired(&self, state: &mut IngestState, now: Timestamp) {
        let timeout = self.config.stream_timeout;
        state
            .active_ssrcs
            .retain(|_, last_seen| now - *last_seen < timeout);
    }

    /// The last computed estimate; `initial_bitrate` before the first
    /// packet.
    pub fn estimate(&self) -> DataRate {
        DataRate::from_bits_per_sec(self.current_estimate_bps.load(Ordering::Acquire))
    }

    /// SSRCs seen within the configured `stream_timeout`, as of `now`.
    pub fn active_ssrcs(&self, now: Timestamp) -> Vec<u32> {
        let mut state = self.state.lock().unwrap();
        self.sweep_expired(&mut state, now);
        state.active_ssrcs.keys().copied().collect()
    }

    /// Delegates to the REMB scheduler (C7).
    pub fn maybe_emit_feedback(&self, now: Timestamp) -> Option<RembPacket> {
        if self.closed.load(Ordering::Acquire) {
            return None;
        }
        let mut state = self.state.lock().unwrap();
        self.sweep_expired(&mut state, now);
        let estimate = self.estimate();
        let active: Vec<u32> = state.active_ssrcs.keys().copied().collect();
        state.remb.maybe_emit(estimate, &active, now)
    }

    /// Returns every component state to its constructor values.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        *state = IngestState::new(&self.config);
        self.current_estimate_bps
            .store(self.config.initial_bitrate.bps(), Ordering::Release);
        self.last_packet_time_us
            .store(Timestamp::minus_infinity().us(), Ordering::Release);
    }

    /// Shuts the estimator down; further `on_packet` calls are no-ops
    /// returning the last estimate.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            warn!("gcc: estimator closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcc::time::TimeDelta;

    fn send_24(ms: i64) -> u32 {
        (((ms * (1 << 18)) / 1000) as u32) & ((1 << 24) - 1)
    }

    #[test]
    fn estimate_defaults_to_initial_bitrate_before_any_packet() {
        let estimator = Estimator::new(EstimatorConfig::default());
        assert_eq!(
            estimator.estimate(),
            EstimatorConfig::default().initial_bitrate
        );
    }

    #[test]
    fn stable_stream_keeps_ssrc_active() {
        let estimator = Estimator::new(EstimatorConfig::default());
        let mut t = 0i64;
        for _ in 0..10 {
            estimator.on_packet(PacketObservation {
                arrival_time: Timestamp::from_millis(t),
                send_time_24: send_24(t),
                size: 1200,
                ssrc: 42,
            });
            t += 20;
        }
        assert_eq!(estimator.active_ssrcs(Timestamp::from_millis(t)), vec![42]);
    }

    #[test]
    fn ssrc_expires_after_stream_timeout() {
        let estimator = Estimator::new(EstimatorConfig::default());
        estimator.on_packet(PacketObservation {
            arrival_time: Timestamp::zero(),
            send_time_24: send_24(0),
            size: 1200,
            ssrc: 7,
        });
        assert!(estimator
            .active_ssrcs(Timestamp::zero() + TimeDelta::from_seconds(3))
            .is_empty());
    }

    #[test]
    fn no_feedback_before_any_packet_still_emits_on_first_call() {
        let estimator = Estimator::new(EstimatorConfig::default());
        // Scheduler's own "no previous emission" rule means the very first
        // call always emits, even with no active streams.
        let feedback = estimator.maybe_emit_feedback(Timestamp::zero());
        assert!(feedback.is_some());
    }

    #[test]
    fn close_freezes_the_estimate() {
        let estimator = Estimator::new(EstimatorConfig::default());
        estimator.on_packet(PacketObservation {
            arrival_time: Timestamp::zero(),
            send_time_24: send_24(0),
            size: 1200,
            ssrc: 1,
        });
        let before = estimator.estimate();
        estimator.close();
        let after = estimator.on_packet(PacketObservation {
            arrival_time: Timestamp::from_millis(20),
            send_time_24: send_24(20),
            size: 1200,
            ssrc: 1,
        });
        assert_eq!(after, before);
    }

    #[test]
    fn reset_restores_initial_bitrate_and_clears_ssrcs() {
        let estimator = Estimator::new(EstimatorConfig::default());
        let mut t = 0i64;
        for _ in 0..5 {
            estimator.on_packet(PacketObservation {
                arrival_time: Timestamp::from_millis(t),
                send_time_24: send_24(t),
                size: 1200,
                ssrc: 3,
            });
            t += 20;
        }
        estimator.reset();
        assert_eq!(
            estimator.estimate(),
            EstimatorConfig::default().initial_bitrate
        );
        assert!(estimator.active_ssrcs(Timestamp::from_millis(t)).is_empty());
    }
}
