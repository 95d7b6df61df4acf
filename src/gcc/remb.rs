//! REMB scheduling and bitrate codec (C7). Stops at the ready-to-marshal
//! structure and leaves wire encoding of the surrounding RTCP packet to
//! the host, which already owns that layer.

use super::data_rate::DataRate;
use super::time::{TimeDelta, Timestamp};

pub const DEFAULT_INTERVAL: TimeDelta = TimeDelta::from_seconds(1);
pub const DEFAULT_DECREASE_THRESHOLD: f64 = 0.03;

const EXPONENT_BITS: u32 = 6;
const MANTISSA_BITS: u32 = 18;
const MAX_MANTISSA: u64 = (1 << MANTISSA_BITS) - 1;
const MAX_EXPONENT: u64 = (1 << EXPONENT_BITS) - 1;

/// The estimator's feedback message, ready to be wrapped in an RTCP
/// payload-specific-feedback packet (FMT 15, PT 206) by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RembPacket {
    pub sender_ssrc: u32,
    pub bitrate: DataRate,
    pub ssrcs: Vec<u32>,
}

/// Encodes a bitrate as REMB's 6-bit-exponent / 18-bit-mantissa pair,
/// choosing the exponent so the mantissa uses as many significant bits as
/// possible without overflowing.
pub fn encode_bitrate(bitrate: DataRate) -> (u8, u32) {
    let bps = bitrate.bps().max(0) as u64;
    let mut exponent = 0u64;
    while bps > (MAX_MANTISSA << exponent) && exponent < MAX_EXPONENT {
        exponent += 1;
    }
    let mantissa = if exponent == 0 {
        bps.min(MAX_MANTISSA)
    } else {
        (bps >> exponent).min(MAX_MANTISSA)
    };
    (exponent as u8, mantissa as u32)
}

pub fn decode_bitrate(exponent: u8, mantissa: u32) -> DataRate {
    DataRate::from_bits_per_sec((mantissa as u64) as i64 * (1i64 << exponent))
}

/// C7: decides when the estimator should emit a REMB message.
pub struct RembScheduler {
    interval: TimeDelta,
    decrease_threshold: f64,
    sender_ssrc: u32,
    last_emitted: Option<Timestamp>,
    previous_estimate: Option<DataRate>,
}

impl RembScheduler {
    pub fn new(interval: TimeDelta, decrease_threshold: f64, sender_ssrc: u32) -> Self {
        Self {
            interval,
            decrease_threshold,
            sender_ssrc,
            last_emitted: None,
            previous_estimate: None,
        }
    }

    pub fn reset(&mut self) {
        self.last_emitted = None;
        self.previous_estimate = None;
    }

    pub fn maybe_emit(
        &mut self,
        current_estimate: DataRate,
        active_ssrcs: &[u32],
        now: Timestamp,
    ) -> Option<RembPacket> {
        let should_emit = match (self.last_emitted, self.previous_estimate) {
            (None, _) => true,
            (Some(_), Some(previous)) if previous.bps() > 0 => {
                let drop = (previous - current_estimate).bps() as f64 / previous.bps() as f64;
                drop >= self.decrease_threshold || now - self.last_emitted.unwrap() >= self.interval
            }
            (Some(last), _) => now - last >= self.interval,
        };

        if !should_emit {
            return None;
        }

        self.last_emitted = Some(now);
        self.previous_estimate = Some(current_estimate);
        Some(RembPacket {
            sender_ssrc: self.sender_ssrc,
            bitrate: current_estimate,
            ssrcs: active_ssrcs.to_vec(),
        })
    }
}
