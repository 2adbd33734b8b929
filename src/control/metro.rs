use tracing::debug;

use crate::{
    broadcast,
    control::node::{ControlNode, NodeCaps, RenderCtx},
    dsp::metro::MetroKernel,
    param::{ParamSlot, Params},
    Error, Result, MAX_BLOCK_SIZE,
};

/// Isochronous trigger generator: single-sample pulses of 1.0 surrounded
/// by 0s, one pulse every `time` seconds on average.
///
/// With `poly > 1` the generator runs `poly` staggered sub-streams per
/// expanded time value, each with period `time * poly` and phase offset
/// `j/poly`. Successive triggers rotate across the streams, so overlapping
/// downstream processes (voice allocation, grain scheduling) get their own
/// channel instead of colliding. `poly` is fixed at construction.
///
/// Defaults: time 1 s, poly 1. A trigger train has no meaningful amplitude
/// to scale, so `set_mul`/`set_add`/`set_sub`/`set_div` are documented
/// no-ops, and the output cannot be routed to the audio bus.
pub struct Metro {
    time: ParamSlot,
    poly: usize,

    kernels: Vec<MetroKernel>, // lmax * poly, stream j of value i at i*poly + j
    channels: Vec<Vec<f32>>,
    frames: usize,
    scratch: Vec<f32>,
}

impl Metro {
    pub fn new() -> Self {
        match Self::with_time(1.0, 1) {
            Ok(metro) => metro,
            // Scalar default and poly 1 always validate.
            Err(_) => unreachable!(),
        }
    }

    pub fn with_time(time: impl Into<Params>, poly: usize) -> Result<Self> {
        if poly == 0 {
            return Err(Error::NonPositivePoly(poly));
        }

        let time = time.into();
        let lmax = broadcast::expand(&[&time])?;
        let time = ParamSlot::new(time);

        let mut kernels = Vec::with_capacity(lmax * poly);
        for i in 0..lmax {
            for j in 0..poly {
                kernels.push(MetroKernel::new(
                    time.value(i) * poly as f32,
                    j as f32 / poly as f32,
                ));
            }
        }

        debug!(channels = lmax * poly, poly, "metro created");
        Ok(Self {
            time,
            poly,
            channels: vec![vec![0.0; MAX_BLOCK_SIZE]; kernels.len()],
            kernels,
            frames: 0,
            scratch: vec![0.0; MAX_BLOCK_SIZE],
        })
    }

    /// Rescale every sub-stream's period. Phase offsets are untouched, so
    /// the streams stay evenly staggered through tempo changes.
    pub fn set_time(&mut self, x: impl Into<Params>) -> Result<()> {
        let x = x.into();
        broadcast::expand(&[&x])?;
        self.time.set(x);
        Ok(())
    }

    pub fn time(&self) -> &Params {
        self.time.params()
    }

    pub fn poly(&self) -> usize {
        self.poly
    }

    /// No-op: triggers are not scalable.
    pub fn set_mul(&mut self, _x: impl Into<Params>) {}

    /// No-op: triggers are not scalable.
    pub fn set_add(&mut self, _x: impl Into<Params>) {}

    /// No-op: triggers are not scalable.
    pub fn set_sub(&mut self, _x: impl Into<Params>) {}

    /// No-op: triggers are not scalable.
    pub fn set_div(&mut self, _x: impl Into<Params>) {}
}

impl Default for Metro {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlNode for Metro {
    fn process_block(&mut self, frames: usize, ctx: &RenderCtx) {
        self.time.refresh(frames, ctx, &mut self.scratch);

        for (idx, (kernel, channel)) in self.kernels.iter_mut().zip(&mut self.channels).enumerate() {
            let i = idx / self.poly;
            kernel.set_period(self.time.value(i) * self.poly as f32);
            kernel.render(&mut channel[..frames], ctx);
        }
        self.frames = frames;
    }

    fn channels(&self) -> usize {
        self.kernels.len()
    }

    fn channel(&self, i: usize) -> &[f32] {
        &self.channels[i][..self.frames]
    }

    fn caps(&self) -> NodeCaps {
        NodeCaps {
            routable: false,
            scalable: false,
        }
    }
}
