//! Receiver-side bandwidth estimation for real-time media transport.
//!
//! Implements the delay-based branch of Google Congestion Control: packets
//! arrive via [`gcc::estimator::Estimator::on_packet`], a bandwidth estimate
//! comes back, and a REMB feedback message is produced on demand via
//! [`gcc::estimator::Estimator::maybe_emit_feedback`]. The crate has no
//! knowledge of RTP/RTCP wire formats; it consumes already-parsed packet
//! fields and produces an already-structured feedback message, leaving
//! marshaling to the host's RTP/RTCP stack.

pub mod error;
pub mod gcc;

pub use error::{Error, Result};
pub use gcc::clock::{Clock, MonotonicClock, SimulatedClock};
pub use gcc::config::{EstimatorConfig, EstimatorConfigBuilder};
pub use gcc::data_rate::{DataRate, DataSize};
pub use gcc::delay_based_filter::DelayFilterKind;
pub use gcc::estimator::{Estimator, PacketObservation};
pub use gcc::overuse_detector::BandwidthUsage;
pub use gcc::remb::RembPacket;
pub use gcc::time::{TimeDelta, Timestamp};
