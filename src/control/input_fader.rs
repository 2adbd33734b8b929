use tracing::debug;

use crate::{
    control::node::RenderCtx,
    param::SignalRef,
    Error, Result, MAX_BLOCK_SIZE,
};

/*
Input Crossfade
===============

Lets a control object swap its upstream source at runtime without a
discontinuity. The swap is a linear blend over `fade_time` seconds of
processed audio (not wall clock):

    weight(t) = min(t / fade_time, 1)
    out       = (1 - weight) * old + weight * new

A fade_time <= 0 is an immediate hard switch.

Re-entrant swaps
----------------

Calling set_input while a fade is still in flight must not discard the
blend abruptly. The in-flight pair is frozen at its instantaneous weight
and becomes the new "old" side: the output at the swap instant is exactly
the blended value the listener was already hearing, and the new fade runs
from there. Frozen pairs nest if swaps keep arriving mid-fade; the chain
collapses back to a single source whenever a fade completes, so depth is
bounded by how many swaps land inside one fade window.

The freeze buffer is allocated when the swap is scheduled (control
context), never in the render path.
*/

enum FadeTail {
    Single(SignalRef),
    Frozen {
        old: Box<FadeTail>,
        new: SignalRef,
        weight: f32,
        scratch: Vec<f32>,
    },
}

impl FadeTail {
    fn render(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        match self {
            FadeTail::Single(source) => source.render(out, ctx),
            FadeTail::Frozen {
                old,
                new,
                weight,
                scratch,
            } => {
                let frames = out.len();
                old.render(&mut scratch[..frames], ctx);
                new.render(out, ctx);
                let w = *weight;
                for (o, &prev) in out.iter_mut().zip(scratch.iter()) {
                    *o = prev * (1.0 - w) + *o * w;
                }
            }
        }
    }
}

pub struct InputFader {
    current: FadeTail,
    pending: Option<SignalRef>,
    fade_seconds: f32,
    fade_samples: u64, // derived from fade_seconds at first rendered block
    cursor: u64,
    old_buf: Vec<f32>,
}

impl InputFader {
    pub fn new(source: SignalRef) -> Self {
        Self {
            current: FadeTail::Single(source),
            pending: None,
            fade_seconds: 0.0,
            fade_samples: 0,
            cursor: 0,
            old_buf: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    /// Schedule a crossfade toward `new` over `fade_time` seconds. A
    /// non-positive fade_time switches immediately. Fails without touching
    /// the current wiring if the new source is unavailable.
    pub fn set_input(&mut self, new: SignalRef, fade_time: f32) -> Result<()> {
        if !new.accessible() {
            return Err(Error::SourceUnavailable);
        }

        if fade_time <= 0.0 {
            self.current = FadeTail::Single(new);
            self.pending = None;
            self.cursor = 0;
            self.fade_samples = 0;
            debug!("input hard-switched");
            return Ok(());
        }

        if let Some(in_flight) = self.pending.take() {
            // Freeze the in-flight pair at its instantaneous weight so the
            // new fade starts from the value currently being heard.
            let weight = if self.fade_samples > 0 {
                (self.cursor as f32 / self.fade_samples as f32).min(1.0)
            } else {
                0.0
            };
            let old = std::mem::replace(&mut self.current, FadeTail::Single(in_flight.clone()));
            self.current = FadeTail::Frozen {
                old: Box::new(old),
                new: in_flight,
                weight,
                scratch: vec![0.0; MAX_BLOCK_SIZE],
            };
        }

        self.pending = Some(new);
        self.fade_seconds = fade_time;
        self.fade_samples = 0;
        self.cursor = 0;
        debug!(fade_time, "input crossfade scheduled");
        Ok(())
    }

    /// True while a crossfade is in flight.
    pub fn fading(&self) -> bool {
        self.pending.is_some()
    }

    /// Produce the blended block. Consumed by the owning control object,
    /// not part of the public surface.
    pub(crate) fn render(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let Some(target) = self.pending.clone() else {
            self.current.render(out, ctx);
            return;
        };

        if self.fade_samples == 0 {
            self.fade_samples = (self.fade_seconds * ctx.sample_rate).round().max(1.0) as u64;
        }

        let frames = out.len();
        self.current.render(&mut self.old_buf[..frames], ctx);
        target.render(out, ctx);

        for (i, (o, &old)) in out.iter_mut().zip(self.old_buf.iter()).enumerate() {
            let w = ((self.cursor + i as u64) as f32 / self.fade_samples as f32).min(1.0);
            *o = old * (1.0 - w) + *o * w;
        }
        self.cursor += frames as u64;

        if self.cursor >= self.fade_samples {
            self.current = FadeTail::Single(target);
            self.pending = None;
            self.cursor = 0;
            self.fade_samples = 0;
        }
    }
}
