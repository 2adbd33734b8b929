use crate::{control::node::RenderCtx, MIN_TIME};

/*
Trigger Generator
=================

A phase accumulator in [0, 1) that emits a single-sample 1.0 each time the
phase wraps, and 0.0 everywhere else. One kernel is one sub-generator of a
polyphonic metronome: the owning control object creates `poly` of these
with a shared period of `time * poly` seconds and initial phases staggered
at j/poly, so successive triggers rotate across the sub-generators while
the combined train still averages one trigger every `time` seconds.

The phase is kept in f64: the per-sample increment can be tiny for long
periods, and an f32 accumulator would audibly drift over minutes.

set_period never touches the phase. Rescaling the period mid-run therefore
preserves the relative offsets between sub-generators, which is what keeps
a polyphonic group evenly spaced through tempo changes.
*/

pub struct MetroKernel {
    period: f32, // seconds per trigger
    phase: f64,  // [0, 1)
}

impl MetroKernel {
    /// `phase_offset` is the initial phase as a fraction of the period.
    pub fn new(period: f32, phase_offset: f32) -> Self {
        Self {
            period: period.max(MIN_TIME),
            phase: f64::from(phase_offset.clamp(0.0, 1.0)) % 1.0,
        }
    }

    pub fn set_period(&mut self, period: f32) {
        self.period = period.max(MIN_TIME);
    }

    pub fn period(&self) -> f32 {
        self.period
    }

    #[inline]
    pub fn next_sample(&mut self, ctx: &RenderCtx) -> f32 {
        self.phase += 1.0 / f64::from(self.period * ctx.sample_rate);
        if self.phase >= 1.0 {
            self.phase -= 1.0;
            1.0
        } else {
            0.0
        }
    }

    pub fn render(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        for sample in out.iter_mut() {
            *sample = self.next_sample(ctx);
        }
    }
}
