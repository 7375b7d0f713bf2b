//! Single-pixel effect engine.
//!
//! The engine owns the active [`EffectDescriptor`] and its phase, and renders
//! one frame per tick of a periodic job requested from a [`JobScheduler`].

use core::cell::RefCell;

use critical_section::Mutex;
use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex};
use embassy_time::{Duration, Instant};

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::color::{BLACK, Rgb, rgb_from_u32};
use crate::effect::{EffectDescriptor, EffectKind, PhaseState, StepContext};
use crate::scheduler::{JobScheduler, PeriodicJob, SpawnError};
use crate::strip::SharedStrip;
use crate::{GlobalBrightness, PixelStrip};

/// Default sampling interval.
pub const DEFAULT_TICK: Duration = Duration::from_millis(10);

/// Configuration for the effect engine
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Interval between two update steps
    pub tick: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { tick: DEFAULT_TICK }
    }
}

/// Mutable runtime state of an engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineState {
    pub descriptor: EffectDescriptor,
    pub running: bool,
    pub phase: PhaseState,
    /// Brightness captured on configure, the ceiling for breath
    pub baseline_brightness: u8,
    /// Bumped on every start and stop. Ticks carrying another value are
    /// left over from an earlier run and render nothing.
    pub generation: u32,
}

impl EngineState {
    const fn new() -> Self {
        Self {
            descriptor: EffectDescriptor::off(),
            running: false,
            phase: PhaseState {
                phase: 0.0,
                cycle_count: 0,
                last_tick: None,
            },
            baseline_brightness: 0,
            generation: 0,
        }
    }

    /// Brightness to put back when the current effect stops rendering
    fn brightness_to_restore(&self) -> Option<u8> {
        (self.running && self.descriptor.kind == EffectKind::Breath)
            .then_some(self.baseline_brightness)
    }

    fn next_generation(&mut self) -> u32 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }
}

/// Effect Engine - drives one pixel of a shared strip
///
/// `configure` may be called at any time, from any context. The new effect
/// is picked up by the very next tick.
///
/// Lock order is strip first, then engine state. The state lock is never
/// held while the strip is pushed to the hardware.
pub struct EffectEngine<'a, D, S, R = CriticalSectionRawMutex>
where
    S: JobScheduler<'a>,
    R: RawMutex,
{
    // External dependencies and configuration
    strip: &'a SharedStrip<D, R>,
    scheduler: &'a S,
    index: u16,
    config: EngineConfig,

    // Internal state
    state: Mutex<RefCell<EngineState>>,
    task: Mutex<RefCell<Option<S::Handle>>>,
}

impl<'a, D, S, R> EffectEngine<'a, D, S, R>
where
    D: PixelStrip + GlobalBrightness + 'a,
    S: JobScheduler<'a> + 'a,
    S::Handle: 'a,
    R: RawMutex + 'a,
{
    /// Create an engine bound to the pixel at `index`
    pub const fn new(strip: &'a SharedStrip<D, R>, scheduler: &'a S, index: u16) -> Self {
        Self::with_config(strip, scheduler, index, EngineConfig { tick: DEFAULT_TICK })
    }

    /// Create an engine with custom configuration
    pub const fn with_config(
        strip: &'a SharedStrip<D, R>,
        scheduler: &'a S,
        index: u16,
        config: EngineConfig,
    ) -> Self {
        Self {
            strip,
            scheduler,
            index,
            config,
            state: Mutex::new(RefCell::new(EngineState::new())),
            task: Mutex::new(RefCell::new(None)),
        }
    }

    /// Index of the driven pixel
    pub const fn index(&self) -> u16 {
        self.index
    }

    /// Replace the active effect
    ///
    /// Resets the phase and cycle count and captures the current strip
    /// brightness as the breath ceiling. When a breath is running its
    /// ceiling is put back first, so the capture never sees a mid-fade
    /// value. Does not start or stop the engine. A zero period is raised
    /// to one tick.
    pub fn configure(&self, kind: EffectKind, color: Rgb, period: Duration, cycle_limit: u16) {
        let descriptor = EffectDescriptor {
            kind,
            color,
            period: period.max(self.config.tick),
            cycle_limit,
        };

        self.strip.lock(|strip| {
            critical_section::with(|cs| {
                let mut state = self.state.borrow(cs).borrow_mut();
                if let Some(brightness) = state.brightness_to_restore() {
                    strip.set_brightness(brightness);
                }
                state.descriptor = descriptor;
                state.phase = PhaseState::default();
                state.baseline_brightness = strip.brightness();
            });
        });

        #[cfg(feature = "esp32-log")]
        println!(
            "[EffectEngine.configure] pixel {}: {} every {}ms, limit {}",
            self.index,
            kind.as_str(),
            descriptor.period.as_millis(),
            cycle_limit
        );
    }

    /// Replace the active effect from raw values
    ///
    /// `color` is `0xRRGGBB`. Unknown kinds fall back to [`EffectKind::None`].
    pub fn configure_raw(&self, kind: u8, color: u32, period_ms: u32, cycle_limit: u16) {
        let kind = EffectKind::from_raw(kind).unwrap_or_default();
        self.configure(
            kind,
            rgb_from_u32(color),
            Duration::from_millis(u64::from(period_ms)),
            cycle_limit,
        );
    }

    /// Start rendering the configured effect
    ///
    /// A running job is torn down first, so there is never more than one.
    /// The transition to running happens in one critical section: a `stop`
    /// racing with the spawn either lands before it and is undone, or after
    /// it and cancels the new job.
    pub fn start(&'a self) -> Result<(), SpawnError> {
        let (generation, previous, restore) = critical_section::with(|cs| {
            let mut state = self.state.borrow(cs).borrow_mut();
            let previous = state.running.then(|| self.task.borrow(cs).take());
            let restore = state.brightness_to_restore();
            state.running = true;
            state.phase.last_tick = None;
            (state.next_generation(), previous, restore)
        });

        if let Some(previous) = previous {
            if let Some(handle) = previous {
                self.scheduler.cancel(handle);
            }
            self.blank(restore);
        }

        match self
            .scheduler
            .spawn_periodic(self.config.tick, self, generation)
        {
            Ok(handle) => {
                let superseded = critical_section::with(|cs| {
                    let state = self.state.borrow(cs).borrow();
                    if state.generation == generation {
                        self.task.borrow(cs).replace(Some(handle))
                    } else {
                        Some(handle)
                    }
                });
                if let Some(handle) = superseded {
                    self.scheduler.cancel(handle);
                }
                #[cfg(feature = "esp32-log")]
                println!("[EffectEngine.start] pixel {} started", self.index);
                Ok(())
            }
            Err(err) => {
                critical_section::with(|cs| {
                    let mut state = self.state.borrow(cs).borrow_mut();
                    if state.generation == generation {
                        state.running = false;
                        state.next_generation();
                    }
                });
                #[cfg(feature = "esp32-log")]
                println!("[EffectEngine.start] pixel {}: {}", self.index, err);
                Err(err)
            }
        }
    }

    /// Stop rendering and turn the pixel off
    ///
    /// The job is cancelled before the pixel is blanked, and a breath puts
    /// the strip brightness back to its ceiling. Does nothing if the engine
    /// is not running.
    pub fn stop(&self) {
        self.halt(None);
    }

    /// Stop the run identified by `generation`, or whichever run is live
    fn halt(&self, generation: Option<u32>) {
        let halted = critical_section::with(|cs| {
            let mut state = self.state.borrow(cs).borrow_mut();
            if !state.running || generation.is_some_and(|g| g != state.generation) {
                return None;
            }
            let restore = state.brightness_to_restore();
            state.running = false;
            state.next_generation();
            Some((self.task.borrow(cs).take(), restore))
        });
        let Some((handle, restore)) = halted else {
            return;
        };

        if let Some(handle) = handle {
            self.scheduler.cancel(handle);
        }
        self.blank(restore);

        #[cfg(feature = "esp32-log")]
        println!("[EffectEngine.stop] pixel {} stopped", self.index);
    }

    fn blank(&self, restore: Option<u8>) {
        self.strip.lock(|strip| {
            if let Some(brightness) = restore {
                strip.set_brightness(brightness);
            }
            strip.set_pixel_color(self.index, BLACK);
            strip.show();
        });
    }

    /// Check if the periodic job is live
    pub fn is_running(&self) -> bool {
        critical_section::with(|cs| self.state.borrow(cs).borrow().running)
    }

    /// Get the active effect
    pub fn descriptor(&self) -> EffectDescriptor {
        critical_section::with(|cs| self.state.borrow(cs).borrow().descriptor)
    }

    /// Get a snapshot of the runtime state
    pub fn state(&self) -> EngineState {
        critical_section::with(|cs| *self.state.borrow(cs).borrow())
    }

    /// Render one tick of the run identified by `generation`
    ///
    /// Called by the periodic job. Descriptor and phase are read and written
    /// within one critical section, so a concurrent `configure` is seen
    /// either entirely or not at all. The frame is pushed after that section
    /// ends, while only the strip lock is held. Ticks of a stopped or
    /// restarted run are dropped.
    pub fn update(&self, now: Instant, generation: u32) {
        let exhausted = self.strip.lock(|strip| {
            let current = strip.pixel_color(self.index);
            let (frame, exhausted) = critical_section::with(|cs| {
                let mut state = self.state.borrow(cs).borrow_mut();
                if !state.running || state.generation != generation {
                    return None;
                }

                let descriptor = state.descriptor;
                let ctx = StepContext {
                    now,
                    tick: self.config.tick,
                    period: descriptor.effective_period(self.config.tick),
                    color: descriptor.color,
                    current,
                    baseline_brightness: state.baseline_brightness,
                };
                let frame = descriptor.kind.step(&ctx, &mut state.phase)?;
                let exhausted =
                    frame.cycle_completed && descriptor.is_exhausted(state.phase.cycle_count);
                Some((frame, exhausted))
            })?;

            if let Some(brightness) = frame.brightness {
                strip.set_brightness(brightness);
            }
            strip.set_pixel_color(self.index, frame.color);
            strip.show();
            Some(exhausted)
        });

        if exhausted == Some(true) {
            #[cfg(feature = "esp32-log")]
            println!(
                "[EffectEngine.update] pixel {} reached its cycle limit",
                self.index
            );
            self.halt(Some(generation));
        }
    }
}

impl<'a, D, S, R> PeriodicJob for EffectEngine<'a, D, S, R>
where
    D: PixelStrip + GlobalBrightness + 'a,
    S: JobScheduler<'a> + 'a,
    S::Handle: 'a,
    R: RawMutex + 'a,
{
    fn run(&self, now: Instant, token: u32) {
        self.update(now, token);
    }
}
