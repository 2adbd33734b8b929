use crate::{control::node::RenderCtx, MIN_TIME};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Fader Envelope
==============

A one-shot amplitude envelope between 0 and 1 with control over fade times
and total duration. It has two modes, selected by `dur`:

  dur == 0   Externally terminated. Sustain holds at 1.0 until stop() arms
             the fadeout.

  dur > 0    Self terminated. The fadeout is scheduled so the envelope
             reaches 0 exactly `dur` seconds after play(). stop() is a
             no-op in this mode; duration alone governs the release.

The Shape
---------

  Level
    1.0 ┐    ╱──────────────╲
        │   ╱                ╲
    0.0 └──╱──────────────────╲───→ Time
         fadein    sustain   fadeout

The State Machine
-----------------

    Idle ──play()──→ Attack ──level=1──→ Sustain ──(stop() or
                        │                   │       dur-fadeout elapsed)
                        │ stop()            ↓
                        └─────────────→ Release ──level=0──→ Done

play() re-arms from any state, starting a fresh attack from 0. stop()
during the attack releases from the current (partial) level rather than
snapping to 1 first, so there is no overshoot and no click.

The attack increment is recomputed each sample from the stored fadein
time rather than cached. Changing
fadein or fadeout mid-flight therefore reshapes nothing retroactively; the
new value is simply used by the next scheduling computation. The release
snapshots its start level and total sample count when it begins, so it
lands exactly on 0.
*/

/// Current phase of the envelope.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaderStage {
    Idle,
    Attack,
    Sustain,
    Release,
    Done,
}

pub struct FaderKernel {
    fadein: f32,
    fadeout: f32,
    dur: f32,

    stage: FaderStage,
    level: f32,
    elapsed: u64, // samples since play()
    release_pending: bool,

    release_start_level: f32,
    release_total: u64,
    release_elapsed: u64,
}

impl FaderKernel {
    pub fn new(fadein: f32, fadeout: f32, dur: f32) -> Self {
        Self {
            fadein: fadein.max(MIN_TIME),
            fadeout: fadeout.max(MIN_TIME),
            dur: dur.max(0.0),
            stage: FaderStage::Idle,
            level: 0.0,
            elapsed: 0,
            release_pending: false,
            release_start_level: 0.0,
            release_total: 1,
            release_elapsed: 0,
        }
    }

    /// Arm the attack. Always restarts from zero, whatever the stage.
    pub fn play(&mut self) {
        self.stage = FaderStage::Attack;
        self.level = 0.0;
        self.elapsed = 0;
        self.release_pending = false;
        self.release_elapsed = 0;
    }

    /// Arm the fadeout; it takes effect on the next processed sample. Only
    /// meaningful in externally-terminated mode (`dur == 0`); with a
    /// positive duration the call is silently ignored, duration governs the
    /// release exclusively.
    pub fn stop(&mut self) {
        if self.dur > 0.0 {
            return;
        }
        if matches!(self.stage, FaderStage::Attack | FaderStage::Sustain) {
            self.release_pending = true;
        }
    }

    pub fn set_fadein(&mut self, x: f32) {
        self.fadein = x.max(MIN_TIME);
    }

    pub fn set_fadeout(&mut self, x: f32) {
        self.fadeout = x.max(MIN_TIME);
    }

    pub fn set_dur(&mut self, x: f32) {
        self.dur = x.max(0.0);
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn stage(&self) -> FaderStage {
        self.stage
    }

    fn begin_release(&mut self, ctx: &RenderCtx) {
        // Snapshot: release runs from the current level, even mid-attack.
        self.release_start_level = self.level;
        self.release_total = (self.fadeout * ctx.sample_rate).round().max(1.0) as u64;
        self.release_elapsed = 0;
        self.stage = FaderStage::Release;
    }

    /// Time-based release in self-terminated mode: the fadeout starts once
    /// `dur - fadeout` seconds have elapsed since play().
    fn release_due(&self, ctx: &RenderCtx) -> bool {
        if self.dur <= 0.0 {
            return false;
        }
        let threshold = ((self.dur - self.fadeout).max(0.0) * ctx.sample_rate).round() as u64;
        self.elapsed >= threshold
    }

    pub fn next_sample(&mut self, ctx: &RenderCtx) -> f32 {
        match self.stage {
            FaderStage::Idle | FaderStage::Done => {
                self.level = 0.0;
            }

            FaderStage::Attack => {
                if self.release_pending {
                    self.release_pending = false;
                    self.begin_release(ctx);
                    return self.next_sample(ctx);
                }
                if self.release_due(ctx) {
                    self.begin_release(ctx);
                    return self.next_sample(ctx);
                }

                let increment = 1.0 / (self.fadein * ctx.sample_rate);
                self.level = (self.level + increment).min(1.0);
                self.elapsed += 1;

                if self.level >= 1.0 {
                    self.stage = FaderStage::Sustain;
                }
            }

            FaderStage::Sustain => {
                if self.release_pending {
                    self.release_pending = false;
                    self.begin_release(ctx);
                    return self.next_sample(ctx);
                }
                if self.release_due(ctx) {
                    self.begin_release(ctx);
                    return self.next_sample(ctx);
                }

                self.level = 1.0;
                self.elapsed += 1;
            }

            FaderStage::Release => {
                let progress = self.release_elapsed as f32 / self.release_total as f32;
                self.level = (self.release_start_level * (1.0 - progress)).max(0.0);
                self.release_elapsed += 1;
                self.elapsed += 1;

                if self.release_elapsed >= self.release_total {
                    self.level = 0.0;
                    self.stage = FaderStage::Done;
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    pub fn render(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        for sample in out.iter_mut() {
            *sample = self.next_sample(ctx);
        }
    }
}
