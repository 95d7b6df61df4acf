//! Monotonic clock abstraction. Every timestamp used by the estimator comes
//! either from this trait or from the unwrapped abs-send-time; the core
//! never reads the wall clock itself.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

use super::time::{TimeDelta, Timestamp};

/// A source of monotonic [`Timestamp`]s, injectable so tests can drive the
/// estimator deterministically instead of depending on wall-clock timing.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// The production clock, backed by [`std::time::Instant`].
#[derive(Debug)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_micros(self.epoch.elapsed().as_micros() as i64)
    }
}

/// A manually-advanced clock for deterministic tests.
#[derive(Debug)]
pub struct SimulatedClock {
    micros: AtomicI64,
}

impl SimulatedClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            micros: AtomicI64::new(start.us()),
        }
    }

    pub fn advance(&self, delta: TimeDelta) {
        self.micros.fetch_add(delta.us(), Ordering::SeqCst);
    }

    pub fn set(&self, t: Timestamp) {
        self.micros.store(t.us(), Ordering::SeqCst);
    }
}

impl Default for SimulatedClock {
    fn default() -> Self {
        Self::new(Timestamp::zero())
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_micros(self.micros.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_clock_advances_deterministically() {
        let clock = SimulatedClock::new(Timestamp::zero());
        assert_eq!(clock.now(), Timestamp::zero());
        clock.advance(TimeDelta::from_millis(20));
        assert_eq!(clock.now(), Timestamp::from_millis(20));
    }

    #[test]
    fn monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock::new();
        let t1 = clock.now();
        let t2 = clock.now();
        assert!(t2 >= t1);
    }
}
