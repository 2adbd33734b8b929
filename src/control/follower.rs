use tracing::debug;

use crate::{
    broadcast,
    control::{
        input_fader::InputFader,
        node::{apply_mul_add, ControlNode, NodeCaps, RenderCtx},
    },
    dsp::follower::FollowerKernel,
    param::{ParamSlot, Params, SignalRef},
    Result, MAX_BLOCK_SIZE,
};

/// Envelope follower: tracks the amplitude envelope of a live input. The
/// output is an analysis signal meant to drive other parameters, so it is
/// not routable to the audio bus.
///
/// Defaults: freq 10 Hz, mul 1, add 0; input swaps crossfade over
/// [`Follower::DEFAULT_FADE`] unless told otherwise.
pub struct Follower {
    input: SignalRef,
    in_fader: InputFader,

    freq: ParamSlot,
    mul: ParamSlot,
    add: ParamSlot,

    kernels: Vec<FollowerKernel>,
    channels: Vec<Vec<f32>>,
    frames: usize,
    scratch: Vec<f32>,
    in_buf: Vec<f32>,
}

impl Follower {
    /// Crossfade length used when a swap does not specify one.
    pub const DEFAULT_FADE: f32 = 0.05;

    pub fn new(input: SignalRef) -> Result<Self> {
        Self::with_freq(input, 10.0)
    }

    pub fn with_freq(input: SignalRef, freq: impl Into<Params>) -> Result<Self> {
        let freq = freq.into();
        let mul: Params = 1.0.into();
        let add: Params = 0.0.into();

        let lmax = broadcast::expand(&[&freq, &mul, &add])?;

        let freq = ParamSlot::new(freq);
        let kernels = (0..lmax).map(|i| FollowerKernel::new(freq.value(i))).collect();

        debug!(channels = lmax, "follower created");
        Ok(Self {
            in_fader: InputFader::new(input.clone()),
            input,
            freq,
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

    /// Swap the input using [`Follower::DEFAULT_FADE`] as the crossfade
    /// length.
    pub fn swap_input(&mut self, x: SignalRef) -> Result<()> {
        self.set_input(x, Self::DEFAULT_FADE)
    }

    pub fn set_freq(&mut self, x: impl Into<Params>) -> Result<()> {
        let x = x.into();
        broadcast::expand(&[&x])?;
        self.freq.set(x);
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

    pub fn freq(&self) -> &Params {
        self.freq.params()
    }

    pub fn mul(&self) -> &Params {
        self.mul.params()
    }

    pub fn add(&self) -> &Params {
        self.add.params()
    }
}

impl ControlNode for Follower {
    fn process_block(&mut self, frames: usize, ctx: &RenderCtx) {
        self.freq.refresh(frames, ctx, &mut self.scratch);
        self.mul.refresh(frames, ctx, &mut self.scratch);
        self.add.refresh(frames, ctx, &mut self.scratch);

        self.in_fader.render(&mut self.in_buf[..frames], ctx);

        for (i, (kernel, channel)) in self.kernels.iter_mut().zip(&mut self.channels).enumerate() {
            kernel.set_freq(self.freq.value(i));

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{Sig, SignalSource};

    const SAMPLE_RATE: f32 = 1_000.0;

    struct AlternatingSource {
        magnitude: f32,
        sign: f32,
    }

    impl SignalSource for AlternatingSource {
        fn process_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
            for sample in out.iter_mut() {
                *sample = self.magnitude * self.sign;
                self.sign = -self.sign;
            }
        }
    }

    fn run_blocks(follower: &mut Follower, blocks: usize, frames: usize) {
        let ctx = RenderCtx::new(SAMPLE_RATE);
        for _ in 0..blocks {
            follower.process_block(frames, &ctx);
        }
    }

    #[test]
    fn tracks_the_input_magnitude() {
        let input = SignalRef::new(AlternatingSource {
            magnitude: 0.6,
            sign: 1.0,
        });
        let mut follower = Follower::new(input).unwrap();
        run_blocks(&mut follower, 50, 100); // 5s at 10 Hz cutoff

        let y = *follower.channel(0).last().unwrap();
        assert!((y - 0.6).abs() < 0.01, "expected ~0.6, got {y}");
    }

    #[test]
    fn freq_list_expands_channel_count() {
        let input = SignalRef::new(Sig::new(0.5));
        let follower = Follower::with_freq(input, vec![5.0, 20.0]).unwrap();
        assert_eq!(follower.channels(), 2);
    }

    #[test]
    fn faster_channel_tracks_sooner() {
        let input = SignalRef::new(Sig::new(1.0));
        let mut follower = Follower::with_freq(input, vec![2.0, 50.0]).unwrap();
        run_blocks(&mut follower, 1, 50);

        let slow = *follower.channel(0).last().unwrap();
        let fast = *follower.channel(1).last().unwrap();
        assert!(fast > slow);
    }

    #[test]
    fn swap_input_matches_the_default_fade_time() {
        let mut swapped = Follower::new(SignalRef::new(Sig::new(0.2))).unwrap();
        let mut explicit = Follower::new(SignalRef::new(Sig::new(0.2))).unwrap();
        run_blocks(&mut swapped, 2, 100);
        run_blocks(&mut explicit, 2, 100);

        swapped.swap_input(SignalRef::new(Sig::new(0.9))).unwrap();
        explicit
            .set_input(SignalRef::new(Sig::new(0.9)), Follower::DEFAULT_FADE)
            .unwrap();

        run_blocks(&mut swapped, 2, 100);
        run_blocks(&mut explicit, 2, 100);
        assert_eq!(swapped.channel(0), explicit.channel(0));
    }

    #[test]
    fn scale_getters_reflect_assignment() {
        let mut follower = Follower::new(SignalRef::new(Sig::new(0.0))).unwrap();
        follower.set_mul(vec![2.0, 4.0]).unwrap();
        follower.set_add(0.5).unwrap();
        assert_eq!(follower.mul().len(), 2);
        assert_eq!(follower.mul().as_slice()[1].constant(), Some(4.0));
        assert_eq!(follower.add().as_slice()[0].constant(), Some(0.5));
    }

    #[test]
    fn output_stays_nonnegative_for_bipolar_input() {
        let input = SignalRef::new(AlternatingSource {
            magnitude: 1.0,
            sign: -1.0,
        });
        let mut follower = Follower::new(input).unwrap();
        run_blocks(&mut follower, 10, 128);
        assert!(follower.channel(0).iter().all(|&s| s >= 0.0));
    }
}
