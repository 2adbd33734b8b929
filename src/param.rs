use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc, Mutex,
};

use crate::{broadcast::wrap, control::node::RenderCtx};

/// A block-rate signal producer that can feed a control object, either as
/// its audio input or as a live parameter value.
pub trait SignalSource: Send {
    /// Render exactly one block into `out`, advancing internal state by
    /// `out.len()` samples.
    fn process_block(&mut self, out: &mut [f32], ctx: &RenderCtx);
}

/// Shared, non-owning handle to a signal-producing object.
///
/// Control objects hold `SignalRef`s to their upstream sources but never own
/// the source's lifetime; that belongs to whoever created it. The processing
/// model is pull-based: each handle must have exactly one block-rate
/// consumer, which drives the source once per processed block.
#[derive(Clone)]
pub struct SignalRef(Arc<Mutex<dyn SignalSource>>);

impl SignalRef {
    pub fn new(source: impl SignalSource + 'static) -> Self {
        Self(Arc::new(Mutex::new(source)))
    }

    /// False once the source's lock has been poisoned by a panic elsewhere.
    pub fn accessible(&self) -> bool {
        !self.0.is_poisoned()
    }

    /// Run `f` against the underlying source. Returns `None` when the lock
    /// is poisoned.
    pub fn with_source<R>(&self, f: impl FnOnce(&mut dyn SignalSource) -> R) -> Option<R> {
        self.0.lock().ok().map(|mut s| f(&mut *s))
    }

    /// Pull one block from the source. A poisoned source renders silence
    /// rather than taking the processing thread down.
    pub(crate) fn render(&self, out: &mut [f32], ctx: &RenderCtx) {
        match self.0.lock() {
            Ok(mut source) => source.process_block(out, ctx),
            Err(_) => out.fill(0.0),
        }
    }
}

/// A parameter value: either a fixed scalar or a live signal.
///
/// Which of the two it is gets decided once, at construction; the render
/// path only ever branches on the enum discriminant.
#[derive(Clone)]
pub enum Param {
    Const(f32),
    Live(SignalRef),
}

impl Param {
    pub fn is_live(&self) -> bool {
        matches!(self, Param::Live(_))
    }

    /// The scalar value, if this parameter is not live.
    pub fn constant(&self) -> Option<f32> {
        match self {
            Param::Const(v) => Some(*v),
            Param::Live(_) => None,
        }
    }

    /// Value to push into kernels for the coming block. A live parameter is
    /// read at control rate: pull one block and keep the last sample.
    pub(crate) fn block_value(&self, frames: usize, ctx: &RenderCtx, scratch: &mut [f32]) -> f32 {
        match self {
            Param::Const(v) => *v,
            Param::Live(source) => {
                let buf = &mut scratch[..frames.max(1)];
                source.render(buf, ctx);
                buf[buf.len() - 1]
            }
        }
    }
}

impl From<f32> for Param {
    fn from(v: f32) -> Self {
        Param::Const(v)
    }
}

impl From<SignalRef> for Param {
    fn from(source: SignalRef) -> Self {
        Param::Live(source)
    }
}

/// An ordered sequence of parameter values, as accepted by control-object
/// constructors and setters. A scalar converts to a one-element sequence
/// that broadcasts to every channel.
#[derive(Clone)]
pub struct Params(Vec<Param>);

impl Params {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Param] {
        &self.0
    }
}

impl From<f32> for Params {
    fn from(v: f32) -> Self {
        Params(vec![Param::Const(v)])
    }
}

impl From<f64> for Params {
    fn from(v: f64) -> Self {
        Params(vec![Param::Const(v as f32)])
    }
}

impl From<i32> for Params {
    fn from(v: i32) -> Self {
        Params(vec![Param::Const(v as f32)])
    }
}

impl From<SignalRef> for Params {
    fn from(source: SignalRef) -> Self {
        Params(vec![Param::Live(source)])
    }
}

impl From<Param> for Params {
    fn from(p: Param) -> Self {
        Params(vec![p])
    }
}

impl From<Vec<Param>> for Params {
    fn from(values: Vec<Param>) -> Self {
        Params(values)
    }
}

impl From<Vec<f32>> for Params {
    fn from(values: Vec<f32>) -> Self {
        Params(values.into_iter().map(Param::Const).collect())
    }
}

impl From<&[f32]> for Params {
    fn from(values: &[f32]) -> Self {
        Params(values.iter().copied().map(Param::Const).collect())
    }
}

/// A parameter list paired with its per-block resolved scalar values.
///
/// Constant entries resolve at assignment time; live entries are refreshed
/// once per block (each list element exactly once, no matter how many
/// channels wrap onto it).
pub(crate) struct ParamSlot {
    params: Params,
    values: Vec<f32>,
    any_live: bool,
}

impl ParamSlot {
    pub(crate) fn new(params: Params) -> Self {
        let mut slot = Self {
            values: Vec::new(),
            any_live: false,
            params,
        };
        slot.resolve_constants();
        slot
    }

    fn resolve_constants(&mut self) {
        self.values = self
            .params
            .as_slice()
            .iter()
            .map(|p| p.constant().unwrap_or(0.0))
            .collect();
        self.any_live = self.params.as_slice().iter().any(Param::is_live);
    }

    /// Replace the list. Length may differ from the original; channel reads
    /// wrap over whatever length is current.
    pub(crate) fn set(&mut self, params: Params) {
        self.params = params;
        self.resolve_constants();
    }

    /// Re-read live entries for the coming block.
    pub(crate) fn refresh(&mut self, frames: usize, ctx: &RenderCtx, scratch: &mut [f32]) {
        if !self.any_live {
            return;
        }
        for (value, param) in self.values.iter_mut().zip(self.params.as_slice()) {
            if param.is_live() {
                *value = param.block_value(frames, ctx, scratch);
            }
        }
    }

    /// Resolved value for channel `chan`, wrapping cyclically.
    pub(crate) fn value(&self, chan: usize) -> f32 {
        *wrap(&self.values, chan)
    }

    pub(crate) fn params(&self) -> &Params {
        &self.params
    }
}

/// Fixed-value signal, settable from the control context. Handy for feeding
/// a scalar where a live input is expected.
///
/// Clones share the same value cell, so keep one clone on the control side
/// and hand the other to [`SignalRef::new`].
#[derive(Clone)]
pub struct Sig {
    bits: Arc<AtomicU32>,
}

impl Sig {
    pub fn new(value: f32) -> Self {
        Self {
            bits: Arc::new(AtomicU32::new(value.to_bits())),
        }
    }

    pub fn set_value(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn value(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

impl SignalSource for Sig {
    fn process_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
        out.fill(self.value());
    }
}
