use crate::{control::node::RenderCtx, MIN_TIME};

/*
Portamento Smoother
===================

A one-pole exponential smoother with separate time constants for upward and
downward motion. Per sample, with target x and previous output y:

    t    = risetime  if x >= y, else falltime
    coef = exp(-1 / (t * sample_rate))
    y    = x + (y - x) * coef

`t` is a standard one-pole time constant: the output covers ~63.2% of a step
after `t` seconds. Because coef is always in (0, 1), the output approaches
the target asymptotically and can never overshoot it.

The coefficient is recomputed per sample from the stored times, so changing
risetime or falltime is just a parameter store; it produces no discontinuity
of its own and applies from the next sample on.
*/

pub struct PortKernel {
    risetime: f32,
    falltime: f32,
    y: f32,
}

impl PortKernel {
    pub fn new(risetime: f32, falltime: f32) -> Self {
        Self {
            risetime: risetime.max(MIN_TIME),
            falltime: falltime.max(MIN_TIME),
            y: 0.0,
        }
    }

    pub fn set_risetime(&mut self, x: f32) {
        self.risetime = x.max(MIN_TIME);
    }

    pub fn set_falltime(&mut self, x: f32) {
        self.falltime = x.max(MIN_TIME);
    }

    pub fn last(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn next_sample(&mut self, x: f32, ctx: &RenderCtx) -> f32 {
        let t = if x >= self.y { self.risetime } else { self.falltime };
        let coef = (-1.0 / (t * ctx.sample_rate)).exp();
        self.y = x + (self.y - x) * coef;
        self.y
    }

    pub fn process(&mut self, input: &[f32], out: &mut [f32], ctx: &RenderCtx) {
        debug_assert_eq!(input.len(), out.len());
        for (o, &x) in out.iter_mut().zip(input.iter()) {
            *o = self.next_sample(x, ctx);
        }
    }
}
