//! Per-channel control-rate kernels.
//!
//! One kernel instance exists per expanded channel of a control object.
//! Kernels are allocation-free and realtime-safe: plain floats in, plain
//! floats out, parameters as stored scalars that the control layer pushes
//! before each block. The orchestration above them (broadcasting, input
//! crossfades, message queues) lives in [`crate::control`].

/// Amplitude envelope state machine.
pub mod fader;
/// Rectifier plus one-pole lowpass for envelope following.
pub mod follower;
/// Phase-accumulator trigger generator.
pub mod metro;
/// Asymmetric one-pole portamento smoother.
pub mod port;

pub use fader::FaderStage;
