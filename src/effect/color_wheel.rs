use super::{Frame, PhaseState, StepContext};
use crate::color::wheel;

const WHEEL_SIZE: f32 = 256.0;

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(super) fn step(ctx: &StepContext, phase: &mut PhaseState) -> Frame {
    let color = wheel(phase.phase as u8);
    let cycle_completed = phase.advance(WHEEL_SIZE / ctx.ticks_per_period(), WHEEL_SIZE);
    phase.last_tick = Some(ctx.now);

    Frame {
        color,
        brightness: None,
        cycle_completed,
    }
}
