use tracing::debug;

use crate::{
    broadcast,
    control::{
        input_fader::InputFader,
        node::{apply_mul_add, ControlNode, NodeCaps, RenderCtx},
    },
    dsp::port::PortKernel,
    param::{ParamSlot, Params, SignalRef},
    Result, MAX_BLOCK_SIZE,
};

/// Exponential portamento with distinct rising and falling times, applied
/// per channel to a live input signal.
///
/// Defaults: risetime 0.05 s, falltime 0.05 s, mul 1, add 0; input swaps
/// crossfade over [`Port::DEFAULT_FADE`] unless told otherwise.
pub struct Port {
    input: SignalRef,
    in_fader: InputFader,

    risetime: ParamSlot,
    falltime: ParamSlot,
    mul: ParamSlot,
    add: ParamSlot,

    kernels: Vec<PortKernel>,
    channels: Vec<Vec<f32>>,
    frames: usize,
    scratch: Vec<f32>,
    in_buf: Vec<f32>,
}

impl Port {
    /// Crossfade length used when a swap does not specify one.
    pub const DEFAULT_FADE: f32 = 0.05;

    pub fn new(input: SignalRef) -> Result<Self> {
        Self::with_times(input, 0.05, 0.05)
    }

    pub fn with_times(
        input: SignalRef,
        risetime: impl Into<Params>,
        falltime: impl Into<Params>,
    ) -> Result<Self> {
        let (risetime, falltime) = (risetime.into(), falltime.into());
        let mul: Params = 1.0.into();
        let add: Params = 0.0.into();

        let lmax = broadcast::expand(&[&risetime, &falltime, &mul, &add])?;

        let risetime = ParamSlot::new(risetime);
        let falltime = ParamSlot::new(falltime);
        let kernels = (0..lmax)
            .map(|i| PortKernel::new(risetime.value(i), falltime.value(i)))
            .collect();

        debug!(channels = lmax, "port created");
        Ok(Self {
            in_fader: InputFader::new(input.clone()),
            input,
            risetime,
            falltime,
            mul: ParamSlot::new(mul),
            add: ParamSlot::new(add),
            kernels,
            channels: vec![vec![0.0; MAX_BLOCK_SIZE]; lmax],
            frames: 0,
            scratch: vec![0.0; MAX_BLOCK_SIZE],
            in_buf: vec![0.0; MAX_BLOCK_SIZE],
        })
    }

    /// Swap the input, crossfading over `fade_time` seconds. On failure the
    /// previous input stays wired.
    pub fn set_input(&mut self, x: SignalRef, fade_time: f32) -> Result<()> {
        self.in_fader.set_input(x.clone(), fade_time)?;
        self.input = x;
        Ok(())
    }

    /// Swap the input using [`Port::DEFAULT_FADE`] as the crossfade length.
    pub fn swap_input(&mut self, x: SignalRef) -> Result<()> {
        self.set_input(x, Self::DEFAULT_FADE)
    }

    pub fn set_risetime(&mut self, x: impl Into<Params>) -> Result<()> {
        let x = x.into();
        broadcast::expand(&[&x])?;
        self.risetime.set(x);
        Ok(())
    }

    pub fn set_falltime(&mut self, x: impl Into<Params>) -> Result<()> {
        let x = x.into();
        broadcast::expand(&[&x])?;
        self.falltime.set(x);
        Ok(())
    }

    pub fn set_mul(&mut self, x: impl Into<Params>) -> Result<()> {
        let x = x.into();
        broadcast::expand(&[&x])?;
        self.mul.set(x);
        Ok(())
    }

    pub fn set_add(&mut self, x: impl Into<Params>) -> Result<()> {
        let x = x.into();
        broadcast::expand(&[&x])?;
        self.add.set(x);
        Ok(())
    }

    pub fn input(&self) -> &SignalRef {
        &self.input
    }

    pub fn risetime(&self) -> &Params {
        self.risetime.params()
    }

    pub fn falltime(&self) -> &Params {
        self.falltime.params()
    }

    pub fn mul(&self) -> &Params {
        self.mul.params()
    }

    pub fn add(&self) -> &Params {
        self.add.params()
    }
}

impl ControlNode for Port {
    fn process_block(&mut self, frames: usize, ctx: &RenderCtx) {
        self.risetime.refresh(frames, ctx, &mut self.scratch);
        self.falltime.refresh(frames, ctx, &mut self.scratch);
        self.mul.refresh(frames, ctx, &mut self.scratch);
        self.add.refresh(frames, ctx, &mut self.scratch);

        self.in_fader.render(&mut self.in_buf[..frames], ctx);

        for (i, (kernel, channel)) in self.kernels.iter_mut().zip(&mut self.channels).enumerate() {
            kernel.set_risetime(self.risetime.value(i));
            kernel.set_falltime(self.falltime.value(i));

            let buf = &mut channel[..frames];
            kernel.process(&self.in_buf[..frames], buf, ctx);
            apply_mul_add(buf, self.mul.value(i), self.add.value(i));
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
            scalable: true,
        }
    }
}
