//! Crate-level error type. Construction is the only fallible surface: once
//! an estimator exists every update is total over its inputs.

/// Errors returned when constructing an estimator from an invalid
/// configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("min_bitrate ({min_bps} bps) must not exceed max_bitrate ({max_bps} bps)")]
    MinExceedsMaxBitrate { min_bps: i64, max_bps: i64 },

    #[error("initial_bitrate ({initial_bps} bps) must fall within [min_bitrate, max_bitrate]")]
    InitialBitrateOutOfBounds { initial_bps: i64 },

    #[error("beta must fall within (0, 1), got {beta}")]
    BetaOutOfRange { beta: f64 },

    #[error("remb_decrease_threshold must fall within (0, 1), got {threshold}")]
    RembDecreaseThresholdOutOfRange { threshold: f64 },

    #[error("burst_threshold must be positive")]
    NonPositiveBurstThreshold,

    #[error("kalman_q must be positive")]
    NonPositiveKalmanProcessNoise,

    #[error("k_u and k_d must both be positive, got k_u={k_u} k_d={k_d}")]
    NonPositiveThresholdRate { k_u: f64, k_d: f64 },

    #[error("threshold_bounds must have a positive min not exceeding max, got [{min_ms}ms, {max_ms}ms]")]
    InvalidThresholdBounds { min_ms: i64, max_ms: i64 },

    #[error("rate_window must be positive")]
    NonPositiveRateWindow,

    #[error("remb_interval must be positive")]
    NonPositiveRembInterval,

    #[error("stream_timeout must be positive")]
    NonPositiveStreamTimeout,
}

pub type Result<T> = std::result::Result<T, Error>;
