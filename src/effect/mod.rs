//! Effect system with compile-time known effect kinds
//!
//! All effects share a single phase accumulator. Each kind knows how to
//! advance it by one tick and which frame to produce.

mod blink;
mod breath;
mod color_wheel;

use embassy_time::{Duration, Instant};

pub use breath::breath_brightness;

use crate::color::{BLACK, Rgb};

const EFFECT_NAME_NONE: &str = "none";
const EFFECT_NAME_BLINK: &str = "blink";
const EFFECT_NAME_BREATH: &str = "breath";
const EFFECT_NAME_COLOR_WHEEL: &str = "color_wheel";

const EFFECT_ID_NONE: u8 = 0;
const EFFECT_ID_BLINK: u8 = 1;
const EFFECT_ID_BREATH: u8 = 2;
const EFFECT_ID_COLOR_WHEEL: u8 = 3;

/// Known effect kinds that can be configured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum EffectKind {
    /// Nothing is rendered
    #[default]
    None = EFFECT_ID_NONE,
    /// Toggle between the color and off
    Blink = EFFECT_ID_BLINK,
    /// Sinusoidal global brightness fade
    Breath = EFFECT_ID_BREATH,
    /// Hue cycling through the color wheel
    ColorWheel = EFFECT_ID_COLOR_WHEEL,
}

impl EffectKind {
    pub fn from_raw(value: u8) -> Option<Self> {
        Some(match value {
            EFFECT_ID_NONE => Self::None,
            EFFECT_ID_BLINK => Self::Blink,
            EFFECT_ID_BREATH => Self::Breath,
            EFFECT_ID_COLOR_WHEEL => Self::ColorWheel,
            _ => return None,
        })
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => EFFECT_NAME_NONE,
            Self::Blink => EFFECT_NAME_BLINK,
            Self::Breath => EFFECT_NAME_BREATH,
            Self::ColorWheel => EFFECT_NAME_COLOR_WHEEL,
        }
    }

    pub fn parse_from_str(s: &str) -> Option<Self> {
        match s {
            EFFECT_NAME_NONE => Some(Self::None),
            EFFECT_NAME_BLINK => Some(Self::Blink),
            EFFECT_NAME_BREATH => Some(Self::Breath),
            EFFECT_NAME_COLOR_WHEEL => Some(Self::ColorWheel),
            _ => None,
        }
    }

    /// Advance the phase by one tick and produce the frame to output
    ///
    /// Returns `None` when nothing has to be written this tick.
    pub(crate) fn step(self, ctx: &StepContext, phase: &mut PhaseState) -> Option<Frame> {
        match self {
            Self::None => None,
            Self::Blink => blink::step(ctx, phase),
            Self::Breath => Some(breath::step(ctx, phase)),
            Self::ColorWheel => Some(color_wheel::step(ctx, phase)),
        }
    }
}

/// The effect currently in place. Replaced as a whole, never patched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectDescriptor {
    pub kind: EffectKind,
    /// Color used by blink and breath
    pub color: Rgb,
    /// Total effect period
    pub period: Duration,
    /// Number of cycles before stopping itself, 0 runs forever
    pub cycle_limit: u16,
}

impl EffectDescriptor {
    /// Descriptor that renders nothing
    pub const fn off() -> Self {
        Self {
            kind: EffectKind::None,
            color: BLACK,
            period: Duration::from_millis(0),
            cycle_limit: 0,
        }
    }

    /// Duration of a single repetition
    ///
    /// A finite cycle limit splits the period into that many repetitions.
    /// Never shorter than one tick.
    pub fn effective_period(&self, tick: Duration) -> Duration {
        let period = if self.cycle_limit > 0 {
            self.period / u32::from(self.cycle_limit)
        } else {
            self.period
        };
        period.max(tick)
    }

    /// Check if `cycle_count` completed cycles exhaust the limit
    pub const fn is_exhausted(&self, cycle_count: u16) -> bool {
        self.cycle_limit > 0 && cycle_count >= self.cycle_limit
    }
}

impl Default for EffectDescriptor {
    fn default() -> Self {
        Self::off()
    }
}

/// Progress of the active effect
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseState {
    /// Radians for breath, wheel position (0..256) for the color wheel
    pub phase: f32,
    /// Cycles completed since the last configure
    pub cycle_count: u16,
    /// Time of the last frame written, `None` until the first tick
    pub last_tick: Option<Instant>,
}

impl PhaseState {
    /// Add `increment` to the phase, wrapping at `full_turn`
    ///
    /// Returns true if the phase wrapped (one cycle completed).
    pub(crate) fn advance(&mut self, increment: f32, full_turn: f32) -> bool {
        self.phase += increment;
        if self.phase < full_turn {
            return false;
        }
        self.phase -= full_turn;
        self.cycle_count = self.cycle_count.saturating_add(1);
        true
    }
}

/// Inputs of a single update step
#[derive(Debug, Clone, Copy)]
pub(crate) struct StepContext {
    pub(crate) now: Instant,
    pub(crate) tick: Duration,
    /// Period of one repetition
    pub(crate) period: Duration,
    pub(crate) color: Rgb,
    /// Color the pixel holds right now
    pub(crate) current: Rgb,
    /// Brightness ceiling for breath
    pub(crate) baseline_brightness: u8,
}

impl StepContext {
    /// Number of ticks in one repetition
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn ticks_per_period(&self) -> f32 {
        let tick_ms = self.tick.as_millis().max(1);
        let steps = self.period.as_millis() as f32 / tick_ms as f32;
        steps.max(1.0)
    }
}

/// Output of a single update step
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Frame {
    pub(crate) color: Rgb,
    /// New global brightness, if the effect drives it
    pub(crate) brightness: Option<u8>,
    /// The step completed one cycle
    pub(crate) cycle_completed: bool,
}
