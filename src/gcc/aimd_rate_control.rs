//! Three-state AIMD controller that turns the overuse signal and the
//! incoming bitrate into a bandwidth estimate (C6). The phase FSM, the
//! `LinkCapacityEstimator` near-max trick, and the multiplicative/additive
//! increase split all carry over from `AimdRateControl` upstream; ALR
//! gating, send-side-only branches, and network-state-estimate bounding
//! are dropped, since this runs a single receive-side instance with no
//! probing input.

use super::data_rate::DataRate;
use super::link_capacity_estimator::LinkCapacityEstimator;
use super::overuse_detector::BandwidthUsage;
use super::time::{TimeDelta, Timestamp};

pub const DEFAULT_MIN_BITRATE: DataRate = DataRate::from_kilobits_per_sec(10);
pub const DEFAULT_MAX_BITRATE: DataRate = DataRate::from_kilobits_per_sec(30_000);
pub const DEFAULT_INITIAL_BITRATE: DataRate = DataRate::from_kilobits_per_sec(300);
pub const DEFAULT_BETA: f64 = 0.85;
const DEFAULT_RTT: TimeDelta = TimeDelta::from_millis(150);
const RESPONSE_TIME_BASE: TimeDelta = TimeDelta::from_millis(100);
const MIN_ADDITIVE_INCREASE: DataRate = DataRate::from_bits_per_sec(1_000);
const DELTA_T_CAP: TimeDelta = TimeDelta::from_seconds(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Hold,
    Increase,
    Decrease,
}

pub struct AimdRateControlConfig {
    pub min_bitrate: DataRate,
    pub max_bitrate: DataRate,
    pub initial_bitrate: DataRate,
    pub beta: f64,
}

impl Default for AimdRateControlConfig {
    fn default() -> Self {
        Self {
            min_bitrate: DEFAULT_MIN_BITRATE,
            max_bitrate: DEFAULT_MAX_BITRATE,
            initial_bitrate: DEFAULT_INITIAL_BITRATE,
            beta: DEFAULT_BETA,
        }
    }
}

/// C6: the AIMD rate controller.
pub struct AimdRateControl {
    min_bitrate: DataRate,
    max_bitrate: DataRate,
    beta: f64,
    estimate: DataRate,
    phase: Phase,
    last_update: Timestamp,
    link_capacity: LinkCapacityEstimator,
    rtt: TimeDelta,
}

impl AimdRateControl {
    pub fn new(config: AimdRateControlConfig) -> Self {
        Self {
            min_bitrate: config.min_bitrate,
            max_bitrate: config.max_bitrate,
            beta: config.beta,
            estimate: config.initial_bitrate,
            phase: Phase::Hold,
            last_update: Timestamp::minus_infinity(),
            link_capacity: LinkCapacityEstimator::new(),
            rtt: DEFAULT_RTT,
        }
    }

    pub fn estimate(&self) -> DataRate {
        self.estimate
    }

    pub fn set_rtt(&mut self, rtt: TimeDelta) {
        self.rtt = rtt;
    }

    pub fn reset(&mut self, initial_bitrate: DataRate) {
        self.estimate = initial_bitrate;
        self.phase = Phase::Hold;
        self.last_update = Timestamp::minus_infinity();
        self.link_capacity = LinkCapacityEstimator::new();
    }

    pub fn update(
        &mut self,
        signal: BandwidthUsage,
        incoming_rate: Option<DataRate>,
        now: Timestamp,
    ) -> DataRate {
        self.phase = next_phase(self.phase, signal);

        match self.phase {
            Phase::Hold => {}
            Phase::Decrease => self.decrease(incoming_rate),
            Phase::Increase => self.increase(now),
        }

        self.estimate = self.estimate.clamp(self.min_bitrate, self.max_bitrate);
        if let Some(incoming_rate) = incoming_rate {
            self.estimate = std::cmp::min(self.estimate, 1.5 * incoming_rate);
        }
        self.last_update = now;
        self.estimate
    }

    fn decrease(&mut self, incoming_rate: Option<DataRate>) {
        if let Some(incoming_rate) = incoming_rate {
            self.estimate = self.beta * incoming_rate;
            // Track the decrease target itself, not the incoming rate:
            // `is_near_max` below compares the *current estimate* against
            // this average, so the average must be of the same quantity.
            self.link_capacity.on_overuse_detected(self.estimate);
        }
    }

    fn increase(&mut self, now: Timestamp) {
        let dt = if self.last_update.is_finite() {
            (now - self.last_update).clamp(TimeDelta::zero(), DELTA_T_CAP)
        } else {
            TimeDelta::zero()
        };

        let near_max = self.link_capacity.is_near_max(self.estimate);

        if near_max {
            let response_time = RESPONSE_TIME_BASE + self.rtt;
            let alpha = 0.5 * (dt.ms_f64() / response_time.ms_f64()).min(1.0);
            let expected_packet_bits = self.estimate.bps() as f64 / 30.0;
            let increase = std::cmp::max(
                MIN_ADDITIVE_INCREASE,
                DataRate::from_bits_per_sec((alpha * expected_packet_bits) as i64),
            );
            self.estimate = self.estimate + increase;
        } else {
            let exponent = dt.ms_f64() / 1000.0;
            self.estimate = 1.08_f64.powf(exponent.min(1.0)) * self.estimate;
        }
    }
}

fn next_phase(current: Phase, signal: BandwidthUsage) -> Phase {
    match (current, signal) {
        (_, BandwidthUsage::Overusing) => Phase::Decrease,
        (Phase::Decrease, BandwidthUsage::Underusing | BandwidthUsage::Normal) => Phase::Hold,
        (_, BandwidthUsage::Underusing) => Phase::Hold,
        (Phase::Hold, BandwidthUsage::Normal) => Phase::Increase,
        (Phase::Increase, BandwidthUsage::Normal) => Phase::Increase,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hold_then_normal_enters_increase_and_grows_estimate() {
        let mut rc = AimdRateControl::new(AimdRateControlConfig::default());
        let before = rc.estimate();
        let mut now = Timestamp::zero();
        let mut last = before;
        for _ in 0..10 {
            now += TimeDelta::from_millis(100);
            last = rc.update(BandwidthUsage::Normal, Some(before), now);
        }
        assert!(last > before);
    }

    #[test]
    fn overuse_triggers_decrease_to_beta_times_incoming() {
        let mut rc = AimdRateControl::new(AimdRateControlConfig::default());
        let incoming = DataRate::from_kilobits_per_sec(1000);
        let now = Timestamp::from_millis(1000);
        let estimate = rc.update(BandwidthUsage::Overusing, Some(incoming), now);
        assert_eq!(estimate, DEFAULT_BETA * incoming);
    }

    #[test]
    fn estimate_never_exceeds_one_point_five_times_incoming_rate() {
        let mut rc = AimdRateControl::new(AimdRateControlConfig::default());
        let incoming = DataRate::from_kilobits_per_sec(50);
        let mut now = Timestamp::zero();
        for _ in 0..50 {
            now += TimeDelta::from_millis(100);
            let estimate = rc.update(BandwidthUsage::Normal, Some(incoming), now);
            assert!(estimate <= 1.5 * incoming);
        }
    }

    #[test]
    fn estimate_stays_within_configured_bounds() {
        let config = AimdRateControlConfig {
            min_bitrate: DataRate::from_kilobits_per_sec(50),
            max_bitrate: DataRate::from_kilobits_per_sec(200),
            ..AimdRateControlConfig::default()
        };
        let mut rc = AimdRateControl::new(config);
        let mut now = Timestamp::zero();
        for _ in 0..200 {
            now += TimeDelta::from_millis(100);
            let estimate = rc.update(BandwidthUsage::Normal, None, now);
            assert!(estimate >= DataRate::from_kilobits_per_sec(50));
            assert!(estimate <= DataRate::from_kilobits_per_sec(200));
        }
    }

    #[test]
    fn converged_near_max_uses_additive_increase() {
        let mut rc = AimdRateControl::new(AimdRateControlConfig::default());
        let incoming = DataRate::from_kilobits_per_sec(500);
        let mut now = Timestamp::zero();
        // Three decreases to converge the link capacity estimator.
        for _ in 0..3 {
            now += TimeDelta::from_millis(100);
            rc.update(BandwidthUsage::Overusing, Some(incoming), now);
        }
        let before = rc.estimate();
        now += TimeDelta::from_millis(100);
        let after = rc.update(BandwidthUsage::Normal, Some(incoming), now);
        // Additive increase on a ~425 kbps estimate over 100ms is on the
        // order of a few hundred bits, nowhere near the ~8% multiplicative
        // step that would otherwise apply.
        assert!(after > before);
        assert!((after - before) < before * 0.08);
    }
}
