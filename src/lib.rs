#![no_std]

pub mod color;
pub mod effect;
pub mod engine;
pub mod scheduler;
pub mod strip;

pub use color::{BLACK, Rgb, rgb_from_u32, rgb_to_u32, wheel};
pub use effect::{EffectDescriptor, EffectKind, PhaseState, breath_brightness};
pub use engine::{DEFAULT_TICK, EffectEngine, EngineConfig, EngineState};
pub use scheduler::{
    JobHandle, JobScheduler, PeriodicJob, PollResult, SpawnError, TickScheduler,
};
pub use strip::{PixelBuffer, SharedStrip};

pub use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, NoopRawMutex, RawMutex};
pub use embassy_time::{Duration, Instant};

/// Abstract pixel strip driver
///
/// Implement this trait to support different hardware platforms.
/// Writes land in a buffer and reach the LEDs on [`PixelStrip::show`].
pub trait PixelStrip {
    /// Set the buffered color of the pixel at `index`
    fn set_pixel_color(&mut self, index: u16, color: Rgb);

    /// Get the buffered color of the pixel at `index`
    fn pixel_color(&self, index: u16) -> Rgb;

    /// Push the buffer to the hardware
    fn show(&mut self);
}

/// Strip-wide brightness control
///
/// Brightness is not per pixel: it scales the whole strip. When several
/// engines share one strip and more than one runs a breath effect, each
/// tick overwrites the value set by the others and the last writer wins.
pub trait GlobalBrightness {
    /// Set the brightness (0-255) of the whole strip
    fn set_brightness(&mut self, brightness: u8);

    /// Get the brightness (0-255) of the whole strip
    fn brightness(&self) -> u8;
}
