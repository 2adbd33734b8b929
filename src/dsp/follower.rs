use std::f32::consts::TAU;

use crate::control::node::RenderCtx;

/*
Envelope Follower
=================

Tracks the slowly-varying amplitude envelope of a faster signal: rectify,
then smooth with a one-pole lowpass.

    coef = exp(-TAU * freq / sample_rate)
    y    = |x| * (1 - coef) + y * coef

`freq` is the lowpass cutoff in Hz. Higher cutoff tracks the input faster
but lets more of the carrier ripple through; lower cutoff is smoother and
lags more. The default of 10 Hz suits amplitude envelopes of audio-rate
material.
*/

pub struct FollowerKernel {
    freq: f32,
    y: f32,
}

impl FollowerKernel {
    pub fn new(freq: f32) -> Self {
        Self {
            freq: freq.max(0.0),
            y: 0.0,
        }
    }

    pub fn set_freq(&mut self, x: f32) {
        self.freq = x.max(0.0);
    }

    pub fn last(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn next_sample(&mut self, x: f32, ctx: &RenderCtx) -> f32 {
        let coef = (-TAU * self.freq / ctx.sample_rate).exp();
        self.y = x.abs() * (1.0 - coef) + self.y * coef;
        self.y
    }

    pub fn process(&mut self, input: &[f32], out: &mut [f32], ctx: &RenderCtx) {
        debug_assert_eq!(input.len(), out.len());
        for (o, &x) in out.iter_mut().zip(input.iter()) {
            *o = self.next_sample(x, ctx);
        }
    }
}
