//! Selects between the two C3 variants at construction and exposes one
//! `update` entry point. A tagged enum rather than `Box<dyn Trait>`: the
//! variant is fixed for the estimator's lifetime, so matching on it per
//! sample costs nothing a vtable call wouldn't, and keeps the hot path
//! free of an allocation and an indirect call.

use super::delay_filter::KalmanDelayFilter;
use super::inter_arrival::DelaySample;
use super::time::Timestamp;
use super::trendline_estimator::TrendlineEstimator;

/// Which delay-filter algorithm the estimator was constructed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayFilterKind {
    Kalman,
    Trendline,
}

pub enum DelayBasedFilter {
    Kalman(KalmanDelayFilter),
    Trendline(TrendlineEstimator),
}

impl DelayBasedFilter {
    /// `kalman_q` only takes effect when `kind` is [`DelayFilterKind::Kalman`];
    /// the trendline variant has no process-noise parameter.
    pub fn new(kind: DelayFilterKind, kalman_q: f64) -> Self {
        match kind {
            DelayFilterKind::Kalman => Self::Kalman(KalmanDelayFilter::new(kalman_q)),
            DelayFilterKind::Trendline => Self::Trendline(TrendlineEstimator::new()),
        }
    }

    pub fn update(&mut self, sample: DelaySample, now: Timestamp) -> f64 {
        match self {
            Self::Kalman(f) => f.update(sample, now),
            Self::Trendline(f) => f.update(sample, now),
        }
    }

    pub fn num_deltas(&self) -> u32 {
        match self {
            Self::Kalman(f) => f.num_deltas(),
            Self::Trendline(f) => f.num_deltas(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::time::TimeDelta;

    fn sample() -> DelaySample {
        DelaySample {
            send_delta: TimeDelta::from_millis(20),
            recv_delta: TimeDelta::from_millis(20),
            size_delta: 0,
        }
    }

    #[test]
    fn both_variants_track_num_deltas() {
        let mut kalman = DelayBasedFilter::new(DelayFilterKind::Kalman, 1e-3);
        let mut trendline = DelayBasedFilter::new(DelayFilterKind::Trendline, 1e-3);
        for _ in 0..5 {
            kalman.update(sample(), Timestamp::zero());
            trendline.update(sample(), Timestamp::zero());
        }
        assert_eq!(kalman.num_deltas(), 5);
        assert_eq!(trendline.num_deltas(), 5);
    }
}
