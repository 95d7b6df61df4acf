//! Receiver-side delay-based bandwidth estimation, branched from
//! Chromium's WebRTC GCC implementation.

pub mod abs_send_time;
pub mod aimd_rate_control;
pub mod clock;
pub mod config;
pub mod data_rate;
pub mod delay_based_filter;
pub mod delay_filter;
pub mod estimator;
pub mod incoming_bitrate;
pub mod inter_arrival;
pub mod link_capacity_estimator;
pub mod overuse_detector;
pub mod remb;
pub mod time;
pub mod trendline_estimator;
