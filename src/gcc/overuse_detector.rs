//! Compares a filtered delay-gradient estimate against an adaptive
//! threshold and requires sustained overuse before signaling congestion.
//! Factored out of `TrendlineEstimator::detect`/`update_threshold` into
//! its own component so both the trendline and Kalman delay-filter
//! variants share one detector instead of each re-implementing the
//! threshold adaptation.

use super::time::{TimeDelta, Timestamp};

pub const DEFAULT_THRESHOLD_MIN: TimeDelta = TimeDelta::from_millis(6);
pub const DEFAULT_THRESHOLD_MAX: TimeDelta = TimeDelta::from_millis(600);
const DELTA_T_CAP: TimeDelta = TimeDelta::from_millis(100);

pub const DEFAULT_K_UP: f64 = 0.01;
pub const DEFAULT_K_DOWN: f64 = 0.00018;

/// A `modified` more than this far past the current threshold skips the
/// adaptation step entirely, so one huge outlier sample can't yank the
/// threshold off its trend line.
const MAX_ADAPT_OFFSET_MS: f64 = 15.0;

/// How `modified` (the num-deltas-weighted gradient) compares to the
/// adaptive threshold over a sustained span of observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandwidthUsage {
    Normal,
    Underusing,
    Overusing,
}

/// Construction-time tuning for the adaptive threshold: the asymmetric
/// up/down rate constants and the clamp bounds, each independently
/// configurable per §6's `k_u`, `k_d`, and `threshold_bounds` options.
#[derive(Debug, Clone, Copy)]
pub struct OveruseDetectorConfig {
    pub overuse_time_threshold: TimeDelta,
    pub k_up: f64,
    pub k_down: f64,
    pub threshold_min: TimeDelta,
    pub threshold_max: TimeDelta,
}

/// C4: owns the adaptive threshold and the sustained-overuse timer.
#[derive(Debug, Clone, Copy)]
pub struct OveruseDetector {
    threshold: TimeDelta,
    threshold_min: TimeDelta,
    threshold_max: TimeDelta,
    k_up: f64,
    k_down: f64,
    last_update: Timestamp,
    overuse_counter: TimeDelta,
    overuse_time_threshold: TimeDelta,
    prev_modified_ms: f64,
    state: BandwidthUsage,
}

impl OveruseDetector {
    pub fn new(config: OveruseDetectorConfig) -> Self {
        Self {
            threshold: TimeDelta::from_millis(12),
            threshold_min: config.threshold_min,
            threshold_max: config.threshold_max,
            k_up: config.k_up,
            k_down: config.k_down,
            last_update: Timestamp::minus_infinity(),
            overuse_counter: TimeDelta::zero(),
            overuse_time_threshold: config.overuse_time_threshold,
            prev_modified_ms: 0.0,
            state: BandwidthUsage::Normal,
        }
    }

    pub fn state(&self) -> BandwidthUsage {
        self.state
    }

    pub fn threshold(&self) -> TimeDelta {
        self.threshold
    }

    /// `filtered_gradient` is expressed in milliseconds/delta (the output
    /// of either C3 variant); `num_deltas` is the count of samples the
    /// filter has ever seen, capped at 60 inside this call.
    pub fn detect(
        &mut self,
        filtered_gradient_ms: f64,
        now: Timestamp,
        num_deltas: u32,
    ) -> BandwidthUsage {
        if num_deltas < 2 {
            return self.state;
        }

        let modified = num_deltas.min(60) as f64 * filtered_gradient_ms;
        let threshold_ms = self.threshold.ms_f64();

        if modified > threshold_ms {
            if self.last_update.is_finite() {
                self.overuse_counter += now - self.last_update;
            }
            if self.overuse_counter >= self.overuse_time_threshold
                && num_deltas >= 2
                && modified >= self.prev_modified_ms
            {
                self.state = BandwidthUsage::Overusing;
            }
        } else if modified < -threshold_ms {
            self.state = BandwidthUsage::Underusing;
            self.overuse_counter = TimeDelta::zero();
        } else {
            self.state = BandwidthUsage::Normal;
            self.overuse_counter = TimeDelta::zero();
        }

        self.update_threshold(modified, now);
        self.prev_modified_ms = modified;
        self.last_update = now;
        self.state
    }

    fn update_threshold(&mut self, modified: f64, now: Timestamp) {
        if !self.last_update.is_finite() {
            self.last_update = now;
            return;
        }

        let threshold_ms = self.threshold.ms_f64();
        if (modified.abs() - threshold_ms) > MAX_ADAPT_OFFSET_MS {
            return;
        }

        let dt = (now - self.last_update).clamp(TimeDelta::zero(), DELTA_T_CAP);
        let k = if modified.abs() < threshold_ms {
            self.k_down
        } else {
            self.k_up
        };

        let updated_ms = threshold_ms + k * (modified.abs() - threshold_ms) * dt.ms_f64();
        self.threshold = TimeDelta::from_micros((updated_ms * 1000.0) as i64)
            .clamp(self.threshold_min, self.threshold_max);
    }
}

impl Default for OveruseDetectorConfig {
    fn default() -> Self {
        Self {
            overuse_time_threshold: TimeDelta::from_millis(10),
            k_up: DEFAULT_K_UP,
            k_down: DEFAULT_K_DOWN,
            threshold_min: DEFAULT_THRESHOLD_MIN,
            threshold_max: DEFAULT_THRESHOLD_MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector(overuse_time_threshold: TimeDelta) -> OveruseDetector {
        OveruseDetector::new(OveruseDetectorConfig {
            overuse_time_threshold,
            ..OveruseDetectorConfig::default()
        })
    }

    #[test]
    fn fewer_than_two_deltas_holds_state() {
        let mut d = detector(TimeDelta::from_millis(10));
        let state = d.detect(50.0, Timestamp::from_millis(0), 1);
        assert_eq!(state, BandwidthUsage::Normal);
    }

    #[test]
    fn sustained_large_gradient_signals_overuse() {
        let mut d = detector(TimeDelta::from_millis(10));
        let mut t = 0i64;
        let mut last = BandwidthUsage::Normal;
        for _ in 0..20 {
            last = d.detect(5.0, Timestamp::from_millis(t), 10);
            t += 20;
        }
        assert_eq!(last, BandwidthUsage::Overusing);
    }

    #[test]
    fn negative_gradient_signals_underuse_and_resets_counter() {
        let mut d = detector(TimeDelta::from_millis(10));
        d.detect(5.0, Timestamp::from_millis(0), 10);
        let state = d.detect(-5.0, Timestamp::from_millis(20), 10);
        assert_eq!(state, BandwidthUsage::Underusing);
        assert_eq!(d.overuse_counter, TimeDelta::zero());
    }

    #[test]
    fn threshold_relaxes_fast_and_tightens_slow() {
        let mut d = detector(TimeDelta::from_millis(10));
        let before = d.threshold();
        // A moderate, sustained excursion should pull the threshold up
        // (k_u); kept within MAX_ADAPT_OFFSET_MS of the threshold so the
        // outlier freeze doesn't suppress adaptation entirely.
        d.detect(2.0, Timestamp::from_millis(0), 10);
        d.detect(2.0, Timestamp::from_millis(100), 10);
        assert!(d.threshold() > before);
    }

    #[test]
    fn threshold_stays_within_bounds() {
        let mut d = detector(TimeDelta::from_millis(10));
        let mut t = 0i64;
        // Seeds `last_update`; the outlier freeze only engages once a
        // previous update exists to compare against.
        d.detect(1.0, Timestamp::from_millis(t), 10);
        for _ in 0..200 {
            t += 100;
            // Each step asks for +10ms over the current threshold, staying
            // inside MAX_ADAPT_OFFSET_MS so adaptation keeps running all
            // the way up to the cap.
            let target_ms = d.threshold().ms_f64() + 10.0;
            d.detect(target_ms / 10.0, Timestamp::from_millis(t), 10);
            assert!(d.threshold() <= TimeDelta::from_millis(600));
        }
        assert_eq!(d.threshold(), TimeDelta::from_millis(600));
    }

    #[test]
    fn huge_outlier_does_not_move_the_threshold() {
        let mut d = detector(TimeDelta::from_millis(10));
        d.detect(1.0, Timestamp::from_millis(0), 10);
        let before = d.threshold();
        // modified = 10 * 1000.0 = 10_000ms, wildly past MAX_ADAPT_OFFSET_MS
        // beyond any threshold in [6ms, 600ms]: adaptation must freeze.
        d.detect(1000.0, Timestamp::from_millis(100), 10);
        assert_eq!(d.threshold(), before);
    }
}
