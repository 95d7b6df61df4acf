//! Trendline variant of the delay filter (C3). Smooths the propagation
//! delay variation into an accumulated-delay trend, then fits a line over
//! a sliding window of recent points and reports its slope.
//!
//! The regression, the exponential smoothing, and the window bookkeeping
//! follow `TrendlineEstimator` directly; threshold adaptation and
//! hypothesis tracking move to `overuse_detector` so this type only ever
//! answers "what is the current gradient", matching C3's narrower
//! `update(sample, now)` contract. Network-state-predictor hooks and
//! window sorting are out of scope and were dropped along with that move.

use std::collections::VecDeque;

use super::inter_arrival::DelaySample;
use super::time::Timestamp;

const DEFAULT_TRENDLINE_SMOOTHING_COEFF: f64 = 0.9;
const DEFAULT_TRENDLINE_THRESHOLD_GAIN: f64 = 4.0;
const DEFAULT_TRENDLINE_WINDOW_SIZE: usize = 20;
const DELTA_COUNTER_MAX: u32 = 1000;

#[derive(Debug, Clone, Copy)]
struct PacketTiming {
    arrival_time_ms: f64,
    smoothed_delay_ms: f64,
}

/// C3 (trendline branch): a bounded window of smoothed-delay points and a
/// least-squares slope over them.
pub struct TrendlineEstimator {
    window_size: usize,
    smoothing_coef: f64,
    threshold_gain: f64,
    num_deltas: u32,
    first_arrival_time_ms: Option<f64>,
    accumulated_delay_ms: f64,
    smoothed_delay_ms: f64,
    history: VecDeque<PacketTiming>,
    prev_trend: f64,
}

impl TrendlineEstimator {
    pub fn new() -> Self {
        Self {
            window_size: DEFAULT_TRENDLINE_WINDOW_SIZE,
            smoothing_coef: DEFAULT_TRENDLINE_SMOOTHING_COEFF,
            threshold_gain: DEFAULT_TRENDLINE_THRESHOLD_GAIN,
            num_deltas: 0,
            first_arrival_time_ms: None,
            accumulated_delay_ms: 0.0,
            smoothed_delay_ms: 0.0,
            history: VecDeque::with_capacity(DEFAULT_TRENDLINE_WINDOW_SIZE + 1),
            prev_trend: 0.0,
        }
    }

    pub fn num_deltas(&self) -> u32 {
        self.num_deltas
    }

    /// Feeds one delay sample; returns the filtered gradient estimate in
    /// milliseconds per delta, already scaled by `threshold_gain` but not
    /// yet by `num_deltas` (the overuse detector applies that uniformly
    /// for both filter variants).
    pub fn update(&mut self, sample: DelaySample, now: Timestamp) -> f64 {
        let delta_ms = sample.propagation_delay_variation().ms_f64();
        self.num_deltas = (self.num_deltas + 1).min(DELTA_COUNTER_MAX);

        let arrival_ms = now.ms_f64();
        let first = *self.first_arrival_time_ms.get_or_insert(arrival_ms);

        self.accumulated_delay_ms += delta_ms;
        self.smoothed_delay_ms = self.smoothing_coef * self.smoothed_delay_ms
            + (1.0 - self.smoothing_coef) * self.accumulated_delay_ms;

        self.history.push_back(PacketTiming {
            arrival_time_ms: arrival_ms - first,
            smoothed_delay_ms: self.smoothed_delay_ms,
        });
        if self.history.len() > self.window_size {
            self.history.pop_front();
        }

        let trend = if self.history.len() == self.window_size {
            linear_fit_slope(&self.history).unwrap_or(self.prev_trend)
        } else {
            self.prev_trend
        };
        self.prev_trend = trend;

        trend * self.threshold_gain
    }
}

impl Default for TrendlineEstimator {
    fn default() -> Self {
        Self::new()
    }
}

fn linear_fit_slope(points: &VecDeque<PacketTiming>) -> Option<f64> {
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    for p in points {
        sum_x += p.arrival_time_ms;
        sum_y += p.smoothed_delay_ms;
    }
    let x_avg = sum_x / points.len() as f64;
    let y_avg = sum_y / points.len() as f64;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for p in points {
        let dx = p.arrival_time_ms - x_avg;
        numerator += dx * (p.smoothed_delay_ms - y_avg);
        denominator += dx * dx;
    }
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::time::TimeDelta;

    fn feed(
        estimator: &mut TrendlineEstimator,
        n: usize,
        send_delta_ms: f64,
        recv_delta_ms: f64,
    ) -> f64 {
        let mut t = Timestamp::zero();
        let mut last = 0.0;
        for _ in 0..n {
            let sample = DelaySample {
                send_delta: TimeDelta::from_micros((send_delta_ms * 1000.0) as i64),
                recv_delta: TimeDelta::from_micros((recv_delta_ms * 1000.0) as i64),
                size_delta: 0,
            };
            last = estimator.update(sample, t);
            t += TimeDelta::from_micros((recv_delta_ms * 1000.0) as i64);
        }
        last
    }

    #[test]
    fn stable_link_yields_near_zero_trend() {
        let mut e = TrendlineEstimator::new();
        let trend = feed(&mut e, 25, 20.0, 20.0);
        assert!(trend.abs() < 0.5, "trend={trend}");
    }

    #[test]
    fn slower_delivery_yields_positive_trend() {
        let mut e = TrendlineEstimator::new();
        let trend = feed(&mut e, 25, 20.0, 22.0);
        assert!(trend > 0.0, "trend={trend}");
    }

    #[test]
    fn faster_delivery_yields_negative_trend() {
        let mut e = TrendlineEstimator::new();
        let trend = feed(&mut e, 25, 20.0, 17.0);
        assert!(trend < 0.0, "trend={trend}");
    }

    #[test]
    fn num_deltas_saturates_at_cap() {
        let mut e = TrendlineEstimator::new();
        feed(&mut e, 1100, 20.0, 20.0);
        assert_eq!(e.num_deltas(), DELTA_COUNTER_MAX);
    }
}
