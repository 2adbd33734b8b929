pub mod broadcast; // Scalar-or-list parameter expansion
pub mod control; // Control objects: fader, port, metro, follower
pub mod dsp; // Per-channel control-rate kernels
pub mod error;
pub mod param; // Scalar-or-signal parameter model

pub use error::{Error, Result};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
