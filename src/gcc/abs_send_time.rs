//! Unwraps the 24-bit abs-send-time RTP header extension into a signed,
//! monotonic-friendly delta. Branched from the general "modular timestamp
//! diff" idiom used throughout this codebase's own `Timestamp`/`TimeDelta`
//! pair, specialized to the 6.18 fixed-point format defined by the
//! abs-send-time extension (one unit is 1/2^18 seconds).

use super::time::TimeDelta;

/// Number of significant bits in an abs-send-time value.
pub const ABS_SEND_TIME_BITS: u32 = 24;
/// `2^24`, one past the highest representable abs-send-time value.
pub const ABS_SEND_TIME_RANGE: i64 = 1 << ABS_SEND_TIME_BITS;
/// Number of fractional bits; one unit is `1 / 2^18` seconds.
pub const ABS_SEND_TIME_FRACTION_BITS: u32 = 18;

const HALF_RANGE: i64 = ABS_SEND_TIME_RANGE / 2;

/// Returns the signed difference, in abs-send-time units, between two 24-bit
/// modular timestamps, resolving the `mod 2^24` ambiguity by assuming the
/// true gap is less than half the wrap range (i.e. under 32 seconds).
///
/// Total and infallible: every `u32` input is implicitly truncated to its
/// low 24 bits before comparison, matching how the RTP header extension is
/// decoded on the wire.
pub fn unwrap(prev: u32, curr: u32) -> i64 {
    let prev = (prev & (ABS_SEND_TIME_RANGE as u32 - 1)) as i64;
    let curr = (curr & (ABS_SEND_TIME_RANGE as u32 - 1)) as i64;
    // Center the modular difference into [-range/2, range/2).
    let wrapped = (curr - prev).rem_euclid(ABS_SEND_TIME_RANGE);
    if wrapped >= HALF_RANGE {
        wrapped - ABS_SEND_TIME_RANGE
    } else {
        wrapped
    }
}

/// Same as [`unwrap`] but expressed as a [`TimeDelta`].
pub fn unwrap_duration(prev: u32, curr: u32) -> TimeDelta {
    let units = unwrap(prev, curr);
    // 1 unit = 1_000_000 / 2^18 microseconds.
    TimeDelta::from_micros((units * 1_000_000) >> ABS_SEND_TIME_FRACTION_BITS)
}
