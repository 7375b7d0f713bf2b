use super::{Frame, PhaseState, StepContext};
use crate::color::BLACK;

/// Toggle the pixel once every half period
///
/// Only the off -> on edge completes a cycle.
pub(super) fn step(ctx: &StepContext, phase: &mut PhaseState) -> Option<Frame> {
    let Some(last) = phase.last_tick else {
        // First tick only anchors the half-period timer
        phase.last_tick = Some(ctx.now);
        return None;
    };
    let half_period = ctx.period / 2;
    if ctx.now.saturating_duration_since(last) < half_period {
        return None;
    }

    let turning_on = ctx.current == BLACK;
    if turning_on {
        phase.cycle_count = phase.cycle_count.saturating_add(1);
    }
    phase.last_tick = Some(ctx.now);

    Some(Frame {
        color: if turning_on { ctx.color } else { BLACK },
        brightness: None,
        cycle_completed: turning_on,
    })
}
