//! Exponentially averaged estimate of the decrease-target bitrate, used by
//! the AIMD rate controller to decide whether the current estimate is
//! close enough to its last known ceiling to warrant a cautious additive
//! increase instead of a multiplicative one. Adds a sample counter so the
//! controller can require convergence over several samples before
//! trusting the estimate as "near max".

use super::data_rate::DataRate;

/// Minimum number of decrease samples before the estimate is trusted for
/// near-max detection.
pub const MIN_SAMPLES_TO_CONVERGE: u32 = 3;

pub struct LinkCapacityEstimator {
    estimate_kbps: Option<f64>,
    deviation_kbps: f64,
    samples: u32,
}

impl LinkCapacityEstimator {
    pub fn new() -> Self {
        Self {
            estimate_kbps: None,
            deviation_kbps: 0.4,
            samples: 0,
        }
    }

    pub fn upper_bound(&self) -> DataRate {
        match self.estimate_kbps {
            Some(estimate_kbps) => DataRate::from_kilobits_per_sec(
                (estimate_kbps + 3.0 * self.deviation_estimate_kbps(estimate_kbps)) as i64,
            ),
            None => DataRate::infinity(),
        }
    }

    pub fn lower_bound(&self) -> DataRate {
        match self.estimate_kbps {
            Some(estimate_kbps) => {
                let kilobits_per_sec = f64::max(
                    0.0,
                    estimate_kbps - 3.0 * self.deviation_estimate_kbps(estimate_kbps),
                );
                DataRate::from_kilobits_per_sec(kilobits_per_sec as i64)
            }
            None => DataRate::zero(),
        }
    }

    pub fn reset(&mut self) {
        self.estimate_kbps = None;
        self.samples = 0;
    }

    pub fn on_overuse_detected(&mut self, acknowledged_rate: DataRate) {
        self.update(acknowledged_rate, 0.05);
    }

    fn update(&mut self, capacity_sample: DataRate, alpha: f64) {
        self.samples += 1;
        let sample_kbps = capacity_sample.kbps() as f64;
        match self.estimate_kbps {
            Some(estimate_kbps) => {
                self.estimate_kbps = Some((1.0 - alpha) * estimate_kbps + alpha * sample_kbps);
            }
            None => {
                self.estimate_kbps = Some(sample_kbps);
            }
        }
        // Estimate the variance of the link capacity estimate and normalize the
        // variance with the link capacity estimate.
        let norm = f64::max(self.estimate_kbps.unwrap(), 1.0);
        let error_kbps = self.estimate_kbps.unwrap() - sample_kbps;
        self.deviation_kbps =
            (1.0 - alpha) * self.deviation_kbps + alpha * error_kbps * error_kbps / norm;
        // 0.4 ~= 14 kbit/s at 500 kbit/s
        // 2.5f ~= 35 kbit/s at 500 kbit/s
        self.deviation_kbps = f64::clamp(self.deviation_kbps, 0.4, 2.5);
    }

    pub fn has_estimate(&self) -> bool {
        self.estimate_kbps.is_some()
    }

    pub fn estimate(&self) -> DataRate {
        DataRate::from_kilobits_per_sec(self.estimate_kbps.unwrap() as i64)
    }

    fn deviation_estimate_kbps(&self, estimate_kbps: f64) -> f64 {
        // Calculate the max bit rate std dev given the normalized
        // variance and the current throughput bitrate. The standard deviation will
        // only be used if estimate_kbps_ has a value.
        f64::sqrt(self.deviation_kbps * estimate_kbps)
    }

    pub fn converged(&self) -> bool {
        self.samples >= MIN_SAMPLES_TO_CONVERGE
    }

    /// Whether `rate` is within one standard deviation of the historical
    /// decrease average — the "near-max" region the rate controller uses
    /// to choose additive over multiplicative increase.
    pub fn is_near_max(&self, rate: DataRate) -> bool {
        match self.estimate_kbps {
            Some(estimate_kbps) if self.converged() => {
                let std_dev = self.deviation_estimate_kbps(estimate_kbps);
                let diff_kbps = (rate.kbps() as f64 - estimate_kbps).abs();
                diff_kbps <= std_dev
            }
            _ => false,
        }
    }
}

impl Default for LinkCapacityEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_estimate_until_first_sample() {
        let e = LinkCapacityEstimator::new();
        assert!(!e.has_estimate());
        assert!(!e.converged());
    }

    #[test]
    fn converges_after_three_samples() {
        let mut e = LinkCapacityEstimator::new();
        for _ in 0..3 {
            e.on_overuse_detected(DataRate::from_kilobits_per_sec(500));
        }
        assert!(e.converged());
    }

    #[test]
    fn reset_clears_estimate_and_sample_count() {
        let mut e = LinkCapacityEstimator::new();
        e.on_overuse_detected(DataRate::from_kilobits_per_sec(500));
        e.reset();
        assert!(!e.has_estimate());
        assert!(!e.converged());
    }
}
