//! Builder for the estimator's construction-time configuration. Each
//! component (`TrendlineEstimator`, `AimdRateControl`, ...) has historically
//! carried its own settings struct; this flattens them into a single
//! validated builder, since every component here is owned by one
//! estimator instance rather than constructed independently.

use crate::error::{Error, Result};
use crate::gcc::data_rate::DataRate;
use crate::gcc::delay_based_filter::DelayFilterKind;
use crate::gcc::delay_filter::DEFAULT_PROCESS_NOISE;
use crate::gcc::overuse_detector::{DEFAULT_K_DOWN, DEFAULT_K_UP, DEFAULT_THRESHOLD_MAX, DEFAULT_THRESHOLD_MIN};
use crate::gcc::time::TimeDelta;

#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    pub initial_bitrate: DataRate,
    pub min_bitrate: DataRate,
    pub max_bitrate: DataRate,
    pub beta: f64,
    pub burst_threshold: TimeDelta,
    pub filter_variant: DelayFilterKind,
    pub kalman_q: f64,
    pub overuse_time_threshold: TimeDelta,
    pub k_u: f64,
    pub k_d: f64,
    pub threshold_min: TimeDelta,
    pub threshold_max: TimeDelta,
    pub rate_window: TimeDelta,
    pub remb_interval: TimeDelta,
    pub remb_decrease_threshold: f64,
    pub stream_timeout: TimeDelta,
    pub sender_ssrc: u32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            initial_bitrate: DataRate::from_bits_per_sec(300_000),
            min_bitrate: DataRate::from_bits_per_sec(10_000),
            max_bitrate: DataRate::from_bits_per_sec(30_000_000),
            beta: 0.85,
            burst_threshold: TimeDelta::from_millis(5),
            filter_variant: DelayFilterKind::Kalman,
            kalman_q: DEFAULT_PROCESS_NOISE,
            overuse_time_threshold: TimeDelta::from_millis(10),
            k_u: DEFAULT_K_UP,
            k_d: DEFAULT_K_DOWN,
            threshold_min: DEFAULT_THRESHOLD_MIN,
            threshold_max: DEFAULT_THRESHOLD_MAX,
            rate_window: TimeDelta::from_seconds(1),
            remb_interval: TimeDelta::from_seconds(1),
            remb_decrease_threshold: 0.03,
            stream_timeout: TimeDelta::from_seconds(2),
            sender_ssrc: 0,
        }
    }
}

impl EstimatorConfig {
    pub fn builder() -> EstimatorConfigBuilder {
        EstimatorConfigBuilder::default()
    }

    fn validate(&self) -> Result<()> {
        if self.min_bitrate > self.max_bitrate {
            return Err(Error::MinExceedsMaxBitrate {
                min_bps: self.min_bitrate.bps(),
                max_bps: self.max_bitrate.bps(),
            });
        }
        if self.initial_bitrate < self.min_bitrate || self.initial_bitrate > self.max_bitrate {
            return Err(Error::InitialBitrateOutOfBounds {
                initial_bps: self.initial_bitrate.bps(),
            });
        }
        if !(self.beta > 0.0 && self.beta < 1.0) {
            return Err(Error::BetaOutOfRange { beta: self.beta });
        }
        if !(self.remb_decrease_threshold > 0.0 && self.remb_decrease_threshold < 1.0) {
            return Err(Error::RembDecreaseThresholdOutOfRange {
                threshold: self.remb_decrease_threshold,
            });
        }
        if self.burst_threshold <= TimeDelta::zero() {
            return Err(Error::NonPositiveBurstThreshold);
        }
        if self.kalman_q <= 0.0 {
            return Err(Error::NonPositiveKalmanProcessNoise);
        }
        if self.k_u <= 0.0 || self.k_d <= 0.0 {
            return Err(Error::NonPositiveThresholdRate {
                k_u: self.k_u,
                k_d: self.k_d,
            });
        }
        if self.threshold_min <= TimeDelta::zero() || self.threshold_min > self.threshold_max {
            return Err(Error::InvalidThresholdBounds {
                min_ms: self.threshold_min.ms(),
                max_ms: self.threshold_max.ms(),
            });
        }
        if self.rate_window <= TimeDelta::zero() {
            return Err(Error::NonPositiveRateWindow);
        }
        if self.remb_interval <= TimeDelta::zero() {
            return Err(Error::NonPositiveRembInterval);
        }
        if self.stream_timeout <= TimeDelta::zero() {
            return Err(Error::NonPositiveStreamTimeout);
        }
        Ok(())
    }
}

/// Builder producing a validated [`EstimatorConfig`]. Every setter is
/// infallible; validation happens once, in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct EstimatorConfigBuilder {
    config: EstimatorConfig,
}

macro_rules! setter {
    ($name:ident, $ty:ty) => {
        pub fn $name(mut self, value: $ty) -> Self {
            self.config.$name = value;
            self
        }
    };
}

impl EstimatorConfigBuilder {
    setter!(initial_bitrate, DataRate);
    setter!(min_bitrate, DataRate);
    setter!(max_bitrate, DataRate);
    setter!(beta, f64);
    setter!(burst_threshold, TimeDelta);
    setter!(filter_variant, DelayFilterKind);
    setter!(kalman_q, f64);
    setter!(overuse_time_threshold, TimeDelta);
    setter!(k_u, f64);
    setter!(k_d, f64);
    setter!(threshold_min, TimeDelta);
    setter!(threshold_max, TimeDelta);
    setter!(rate_window, TimeDelta);
    setter!(remb_interval, TimeDelta);
    setter!(remb_decrease_threshold, f64);
    setter!(stream_timeout, TimeDelta);
    setter!(sender_ssrc, u32);

    pub fn build(self) -> Result<EstimatorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EstimatorConfig::builder().build().is_ok());
    }

    #[test]
    fn min_exceeding_max_is_rejected() {
        let result = EstimatorConfig::builder()
            .min_bitrate(DataRate::from_kilobits_per_sec(100))
            .max_bitrate(DataRate::from_kilobits_per_sec(10))
            .build();
        assert!(matches!(result, Err(Error::MinExceedsMaxBitrate { .. })));
    }

    #[test]
    fn beta_out_of_range_is_rejected() {
        let result = EstimatorConfig::builder().beta(1.5).build();
        assert!(matches!(result, Err(Error::BetaOutOfRange { .. })));
    }

    #[test]
    fn zero_burst_threshold_is_rejected() {
        let result = EstimatorConfig::builder()
            .burst_threshold(TimeDelta::zero())
            .build();
        assert!(matches!(result, Err(Error::NonPositiveBurstThreshold)));
    }

    #[test]
    fn non_positive_kalman_process_noise_is_rejected() {
        let result = EstimatorConfig::builder().kalman_q(0.0).build();
        assert!(matches!(result, Err(Error::NonPositiveKalmanProcessNoise)));
    }

    #[test]
    fn non_positive_threshold_rate_is_rejected() {
        let result = EstimatorConfig::builder().k_u(0.0).build();
        assert!(matches!(result, Err(Error::NonPositiveThresholdRate { .. })));
    }

    #[test]
    fn threshold_min_exceeding_max_is_rejected() {
        let result = EstimatorConfig::builder()
            .threshold_min(TimeDelta::from_millis(700))
            .threshold_max(TimeDelta::from_millis(600))
            .build();
        assert!(matches!(result, Err(Error::InvalidThresholdBounds { .. })));
    }
}
