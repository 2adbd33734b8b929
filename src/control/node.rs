#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-engine render configuration, passed by reference into every block.
pub struct RenderCtx {
    pub sample_rate: f32,
}

impl RenderCtx {
    pub fn new(sample_rate: f32) -> Self {
        Self { sample_rate }
    }
}

/// What a control-object kind is allowed to do.
///
/// Pure control generators keep both capabilities off: their output exists
/// to drive other objects' parameters, not the audio bus, and a trigger
/// train additionally has no meaningful amplitude to scale.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeCaps {
    /// May this node's output be routed to the audio output bus?
    pub routable: bool,
    /// Do `mul`/`add` scaling parameters apply to this node?
    pub scalable: bool,
}

/// A block-synchronous, multichannel control signal generator.
///
/// A single processing thread calls [`ControlNode::process_block`] on every
/// live node once per block, in engine order; nodes pull their upstream
/// sources from inside that call. Setters are applied between blocks, never
/// concurrently with one.
pub trait ControlNode: Send {
    /// Advance internal state by exactly `frames` samples and fill the
    /// per-channel output buffers.
    fn process_block(&mut self, frames: usize, ctx: &RenderCtx);

    /// Channel count, fixed at construction.
    fn channels(&self) -> usize;

    /// Output of channel `i` for the most recently processed block.
    fn channel(&self, i: usize) -> &[f32];

    fn caps(&self) -> NodeCaps;

    /// Route channel `chnl` to the audio output bus. For every node in this
    /// crate `caps().routable` is false and this is a guaranteed no-op; it
    /// exists so callers can treat control and audio generators uniformly.
    fn out(&mut self, _chnl: usize) {}
}

/// Post-kernel scaling: `y * mul + add`.
#[inline]
pub(crate) fn apply_mul_add(buf: &mut [f32], mul: f32, add: f32) {
    if mul == 1.0 && add == 0.0 {
        return;
    }
    for sample in buf.iter_mut() {
        *sample = *sample * mul + add;
    }
}
