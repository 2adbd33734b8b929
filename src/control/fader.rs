use tracing::debug;

use crate::{
    broadcast,
    control::node::{apply_mul_add, ControlNode, NodeCaps, RenderCtx},
    dsp::fader::{FaderKernel, FaderStage},
    param::{ParamSlot, Params},
    Result, MAX_BLOCK_SIZE,
};

/// Amplitude envelope between 0 and 1 with control over fade times and
/// total duration. One kernel per expanded channel; `play()` is not called
/// at construction time.
///
/// Defaults: fadein 0.01 s, fadeout 0.1 s, dur 0 (hold until `stop()`),
/// mul 1, add 0. The output cannot be routed to the audio bus; a fader
/// exists to drive other objects' parameters.
pub struct Fader {
    fadein: ParamSlot,
    fadeout: ParamSlot,
    dur: ParamSlot,
    mul: ParamSlot,
    add: ParamSlot,

    kernels: Vec<FaderKernel>,
    channels: Vec<Vec<f32>>,
    frames: usize,
    scratch: Vec<f32>,
}

impl Fader {
    pub fn new() -> Self {
        match Self::with_times(0.01, 0.1, 0.0) {
            Ok(fader) => fader,
            // Scalar defaults always expand to one channel.
            Err(_) => unreachable!(),
        }
    }

    pub fn with_times(
        fadein: impl Into<Params>,
        fadeout: impl Into<Params>,
        dur: impl Into<Params>,
    ) -> Result<Self> {
        let (fadein, fadeout, dur) = (fadein.into(), fadeout.into(), dur.into());
        let mul: Params = 1.0.into();
        let add: Params = 0.0.into();

        let lmax = broadcast::expand(&[&fadein, &fadeout, &dur, &mul, &add])?;

        let fadein = ParamSlot::new(fadein);
        let fadeout = ParamSlot::new(fadeout);
        let dur = ParamSlot::new(dur);

        let kernels = (0..lmax)
            .map(|i| FaderKernel::new(fadein.value(i), fadeout.value(i), dur.value(i)))
            .collect();

        debug!(channels = lmax, "fader created");
        Ok(Self {
            fadein,
            fadeout,
            dur,
            mul: ParamSlot::new(mul),
            add: ParamSlot::new(add),
            kernels,
            channels: vec![vec![0.0; MAX_BLOCK_SIZE]; lmax],
            frames: 0,
            scratch: vec![0.0; MAX_BLOCK_SIZE],
        })
    }

    /// Arm the attack on every channel.
    pub fn play(&mut self) {
        debug!("fader play");
        for kernel in &mut self.kernels {
            kernel.play();
        }
    }

    /// Arm the fadeout on every channel. Ignored on channels whose `dur` is
    /// positive; duration governs the release there.
    pub fn stop(&mut self) {
        debug!("fader stop");
        for kernel in &mut self.kernels {
            kernel.stop();
        }
    }

    pub fn set_fadein(&mut self, x: impl Into<Params>) -> Result<()> {
        let x = x.into();
        broadcast::expand(&[&x])?;
        self.fadein.set(x);
        self.push_constants();
        Ok(())
    }

    pub fn set_fadeout(&mut self, x: impl Into<Params>) -> Result<()> {
        let x = x.into();
        broadcast::expand(&[&x])?;
        self.fadeout.set(x);
        self.push_constants();
        Ok(())
    }

    pub fn set_dur(&mut self, x: impl Into<Params>) -> Result<()> {
        let x = x.into();
        broadcast::expand(&[&x])?;
        self.dur.set(x);
        self.push_constants();
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

    pub fn fadein(&self) -> &Params {
        self.fadein.params()
    }

    pub fn fadeout(&self) -> &Params {
        self.fadeout.params()
    }

    pub fn dur(&self) -> &Params {
        self.dur.params()
    }

    pub fn mul(&self) -> &Params {
        self.mul.params()
    }

    pub fn add(&self) -> &Params {
        self.add.params()
    }

    /// Stage of channel `i`'s envelope.
    pub fn stage(&self, i: usize) -> FaderStage {
        broadcast::wrap(&self.kernels, i).stage()
    }

    /// Wrap resolved values into the existing kernels. Channel count never
    /// changes here; a longer list wraps onto the channels there are.
    fn push_constants(&mut self) {
        for (i, kernel) in self.kernels.iter_mut().enumerate() {
            kernel.set_fadein(self.fadein.value(i));
            kernel.set_fadeout(self.fadeout.value(i));
            kernel.set_dur(self.dur.value(i));
        }
    }
}

impl Default for Fader {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlNode for Fader {
    fn process_block(&mut self, frames: usize, ctx: &RenderCtx) {
        self.fadein.refresh(frames, ctx, &mut self.scratch);
        self.fadeout.refresh(frames, ctx, &mut self.scratch);
        self.dur.refresh(frames, ctx, &mut self.scratch);
        self.mul.refresh(frames, ctx, &mut self.scratch);
        self.add.refresh(frames, ctx, &mut self.scratch);

        for (i, (kernel, channel)) in self.kernels.iter_mut().zip(&mut self.channels).enumerate() {
            kernel.set_fadein(self.fadein.value(i));
            kernel.set_fadeout(self.fadeout.value(i));
            kernel.set_dur(self.dur.value(i));

            let buf = &mut channel[..frames];
            kernel.render(buf, ctx);
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

#[cfg(feature = "rtrb")]
pub use shared::{FaderHandle, FaderMessage, SharedFader};

#[cfg(feature = "rtrb")]
mod shared {
    use rtrb::{Consumer, Producer, RingBuffer};

    use super::Fader;
    use crate::control::node::{ControlNode, NodeCaps, RenderCtx};

    /// Transport and parameter messages for a fader driven from another
    /// thread. Drained at block start, so every message applies atomically
    /// between blocks.
    #[derive(Debug, Copy, Clone)]
    pub enum FaderMessage {
        Play,
        Stop,
        SetFadein(f32),
        SetFadeout(f32),
        SetDur(f32),
    }

    const FADER_QUEUE_SIZE: usize = 64;

    /// Control-thread side: pushes messages, never blocks.
    pub struct FaderHandle {
        tx: Producer<FaderMessage>,
    }

    impl FaderHandle {
        pub fn play(&mut self) {
            let _ = self.tx.push(FaderMessage::Play);
        }

        pub fn stop(&mut self) {
            let _ = self.tx.push(FaderMessage::Stop);
        }

        pub fn set_fadein(&mut self, x: f32) {
            let _ = self.tx.push(FaderMessage::SetFadein(x));
        }

        pub fn set_fadeout(&mut self, x: f32) {
            let _ = self.tx.push(FaderMessage::SetFadeout(x));
        }

        pub fn set_dur(&mut self, x: f32) {
            let _ = self.tx.push(FaderMessage::SetDur(x));
        }
    }

    /// Processing-thread side: a fader plus the receiving end of the queue.
    pub struct SharedFader {
        fader: Fader,
        rx: Consumer<FaderMessage>,
    }

    impl SharedFader {
        pub fn new(fader: Fader) -> (Self, FaderHandle) {
            let (tx, rx) = RingBuffer::<FaderMessage>::new(FADER_QUEUE_SIZE);
            (Self { fader, rx }, FaderHandle { tx })
        }

        pub fn fader(&self) -> &Fader {
            &self.fader
        }
    }

    impl ControlNode for SharedFader {
        fn process_block(&mut self, frames: usize, ctx: &RenderCtx) {
            while let Ok(msg) = self.rx.pop() {
                match msg {
                    FaderMessage::Play => self.fader.play(),
                    FaderMessage::Stop => self.fader.stop(),
                    FaderMessage::SetFadein(x) => {
                        let _ = self.fader.set_fadein(x);
                    }
                    FaderMessage::SetFadeout(x) => {
                        let _ = self.fader.set_fadeout(x);
                    }
                    FaderMessage::SetDur(x) => {
                        let _ = self.fader.set_dur(x);
                    }
                }
            }
            self.fader.process_block(frames, ctx);
        }

        fn channels(&self) -> usize {
            self.fader.channels()
        }

        fn channel(&self, i: usize) -> &[f32] {
            self.fader.channel(i)
        }

        fn caps(&self) -> NodeCaps {
            self.fader.caps()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn ctx() -> RenderCtx {
        RenderCtx::new(SAMPLE_RATE)
    }

    fn run_blocks(fader: &mut Fader, blocks: usize, frames: usize) {
        let ctx = ctx();
        for _ in 0..blocks {
            fader.process_block(frames, &ctx);
        }
    }

    #[test]
    fn broadcast_expands_to_longest_list() {
        let fader = Fader::with_times(vec![0.1, 0.2, 0.3], 0.05, 0.0).unwrap();
        assert_eq!(fader.channels(), 3);
    }

    #[test]
    fn empty_parameter_list_is_rejected() {
        assert!(Fader::with_times(Vec::<f32>::new(), 0.1, 0.0).is_err());
    }

    #[test]
    fn holds_sustain_until_stop() {
        let mut fader = Fader::with_times(0.01, 0.1, 0.0).unwrap();
        fader.play();
        run_blocks(&mut fader, 10, 100); // 1s >> fadein

        assert!(fader.channel(0).iter().all(|&s| s <= 1.0));
        assert_eq!(*fader.channel(0).last().unwrap(), 1.0);

        fader.stop();
        run_blocks(&mut fader, 2, 100); // 0.2s > fadeout
        assert_eq!(*fader.channel(0).last().unwrap(), 0.0);
        assert_eq!(fader.stage(0), FaderStage::Done);
    }

    #[test]
    fn setter_with_current_value_leaves_output_identical() {
        let mut a = Fader::with_times(0.05, 0.1, 0.0).unwrap();
        let mut b = Fader::with_times(0.05, 0.1, 0.0).unwrap();
        a.play();
        b.play();

        run_blocks(&mut a, 1, 64);
        run_blocks(&mut b, 1, 64);

        b.set_fadein(0.05).unwrap(); // idempotent reassignment
        run_blocks(&mut a, 1, 64);
        run_blocks(&mut b, 1, 64);

        assert_eq!(a.channel(0), b.channel(0));
    }

    #[test]
    fn mul_add_scale_the_envelope() {
        let mut fader = Fader::with_times(0.01, 0.1, 0.0).unwrap();
        fader.set_mul(2.0).unwrap();
        fader.set_add(1.0).unwrap();
        fader.play();
        run_blocks(&mut fader, 5, 100);

        // Sustain level 1.0 scaled to 1.0 * 2 + 1 = 3.0.
        assert_eq!(*fader.channel(0).last().unwrap(), 3.0);
    }

    #[test]
    fn scale_getters_reflect_assignment() {
        let mut fader = Fader::new();
        assert_eq!(fader.mul().as_slice()[0].constant(), Some(1.0));
        assert_eq!(fader.add().as_slice()[0].constant(), Some(0.0));

        fader.set_mul(2.0).unwrap();
        fader.set_add(vec![0.5, 1.5]).unwrap();
        assert_eq!(fader.mul().as_slice()[0].constant(), Some(2.0));
        assert_eq!(fader.add().len(), 2);
    }

    #[test]
    fn out_is_a_no_op() {
        let mut fader = Fader::new();
        assert!(!fader.caps().routable);
        fader.play();
        fader.out(0);
        run_blocks(&mut fader, 1, 32);
        // Nothing observable: out() neither panics nor changes the signal.
        assert!(fader.channel(0).iter().all(|&s| s >= 0.0));
    }

    #[cfg(feature = "rtrb")]
    #[test]
    fn shared_fader_applies_messages_at_block_start() {
        let (mut shared, mut handle) = SharedFader::new(Fader::with_times(0.01, 0.01, 0.0).unwrap());

        handle.play();
        let ctx = ctx();
        for _ in 0..5 {
            shared.process_block(100, &ctx);
        }
        assert_eq!(*shared.channel(0).last().unwrap(), 1.0);

        handle.stop();
        for _ in 0..5 {
            shared.process_block(100, &ctx);
        }
        assert_eq!(*shared.channel(0).last().unwrap(), 0.0);
    }
}
