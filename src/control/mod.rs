//! Control objects: the orchestration layer over the per-channel kernels.
//!
//! Each control object expands its scalar-or-list arguments into a fixed
//! channel count, owns one kernel per channel, and keeps kernel parameters
//! in sync when setters re-run the broadcaster. Objects that take a signal
//! input own an [`input_fader::InputFader`] so the source can be swapped at
//! runtime without a click.

/// Amplitude envelope with fade times and optional fixed duration.
pub mod fader;
/// Envelope follower.
pub mod follower;
/// Click-free input switching via bounded-time crossfade.
pub mod input_fader;
/// Polyphonic isochronous trigger generator.
pub mod metro;
/// Core trait and render context shared by all control objects.
pub mod node;
/// Asymmetric exponential portamento.
pub mod port;

pub use fader::Fader;
pub use follower::Follower;
pub use input_fader::InputFader;
pub use metro::Metro;
pub use node::{ControlNode, NodeCaps, RenderCtx};
pub use port::Port;

#[cfg(feature = "rtrb")]
pub use fader::{FaderHandle, FaderMessage, SharedFader};
