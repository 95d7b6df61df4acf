//! Kalman-filter variant of the delay filter (C3). Tracks a single scalar
//! state, the propagation-delay gradient, with a process-noise-driven
//! random walk model and an exponentially updated measurement variance.
//!
//! Follows the classic scalar Kalman update (prediction step adds process
//! noise, then a gain-weighted innovation updates state and covariance),
//! with one deliberate split: the innovation used to update the
//! measurement-variance estimate is capped at a few standard deviations so
//! a single outlier sample can't blow up the noise floor, while the
//! innovation used to update the gradient state itself is left uncapped
//! so a genuine, sustained shift is still tracked quickly.

use super::inter_arrival::DelaySample;
use super::time::Timestamp;

pub const DEFAULT_PROCESS_NOISE: f64 = 1e-3;
const VARIANCE_EMA_BETA: f64 = 0.05;
const MIN_MEASUREMENT_VARIANCE_MS2: f64 = 1.0;
const INNOVATION_CAP_STD_DEVS: f64 = 3.0;

/// C3 (Kalman branch): a one-state Kalman filter over the propagation
/// delay gradient, expressed in milliseconds per delta.
pub struct KalmanDelayFilter {
    process_noise: f64,
    gradient_estimate: f64,
    estimate_variance: f64,
    measurement_variance: f64,
    num_deltas: u32,
    last_update: Timestamp,
}

impl KalmanDelayFilter {
    /// `process_noise` is `q` in §6's configuration table: the variance
    /// injected into the gradient estimate on every update.
    pub fn new(process_noise: f64) -> Self {
        Self {
            process_noise,
            gradient_estimate: 0.0,
            estimate_variance: 0.0,
            measurement_variance: MIN_MEASUREMENT_VARIANCE_MS2,
            num_deltas: 0,
            last_update: Timestamp::minus_infinity(),
        }
    }

    pub fn num_deltas(&self) -> u32 {
        self.num_deltas
    }

    /// Feeds one delay sample; returns the filtered gradient estimate in
    /// milliseconds per delta. No `threshold_gain` or `num_deltas` scaling
    /// is applied here — the overuse detector applies the `num_deltas`
    /// weighting uniformly across both filter variants, and this variant
    /// has no analogue of the trendline's `threshold_gain`.
    pub fn update(&mut self, sample: DelaySample, now: Timestamp) -> f64 {
        self.num_deltas += 1;
        self.last_update = now;

        // Process-noise injection.
        self.estimate_variance += self.process_noise;

        let measurement_ms = sample.propagation_delay_variation().ms_f64();
        let innovation = measurement_ms - self.gradient_estimate;

        let std_dev = self.measurement_variance.sqrt();
        let capped_innovation = innovation.clamp(
            -INNOVATION_CAP_STD_DEVS * std_dev,
            INNOVATION_CAP_STD_DEVS * std_dev,
        );

        self.measurement_variance = (1.0 - VARIANCE_EMA_BETA) * self.measurement_variance
            + VARIANCE_EMA_BETA * capped_innovation * capped_innovation;
        self.measurement_variance = self.measurement_variance.max(MIN_MEASUREMENT_VARIANCE_MS2);

        let gain = self.estimate_variance / (self.measurement_variance + self.estimate_variance);
        // State update uses the uncapped innovation.
        self.gradient_estimate += gain * innovation;
        self.estimate_variance = (1.0 - gain) * self.estimate_variance;

        self.gradient_estimate
    }
}

impl Default for KalmanDelayFilter {
    fn default() -> Self {
        Self::new(DEFAULT_PROCESS_NOISE)
    }
}
