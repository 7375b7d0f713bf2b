//! Breathing fade
//!
//! Drives the strip-wide brightness along a raised cosine so that every
//! cycle starts and ends dark and peaks at half period.

use core::f32::consts::TAU;

use super::{Frame, PhaseState, StepContext};

/// Brightness at `phase` radians, scaled to `baseline`
///
/// Zero at phase 0, `baseline` at phase π.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn breath_brightness(baseline: u8, phase: f32) -> u8 {
    let level = (1.0 - libm::cosf(phase)) / 2.0;
    let value = libm::roundf(f32::from(baseline) * level);
    value.clamp(0.0, f32::from(baseline)) as u8
}

pub(super) fn step(ctx: &StepContext, phase: &mut PhaseState) -> Frame {
    let brightness = breath_brightness(ctx.baseline_brightness, phase.phase);
    let cycle_completed = phase.advance(TAU / ctx.ticks_per_period(), TAU);
    phase.last_tick = Some(ctx.now);

    Frame {
        color: ctx.color,
        brightness: Some(brightness),
        cycle_completed,
    }
}
