#![allow(dead_code)]

use myrtio_pixel_effects::{
    BLACK, EffectEngine, GlobalBrightness, Instant, PixelStrip, Rgb, SharedStrip, TickScheduler,
};

pub const PIXELS: usize = 8;

pub type TestScheduler = TickScheduler<'static, 4>;
pub type TestEngine = EffectEngine<'static, RecordingStrip, TestScheduler>;

/// Strip driver that records every call
pub struct RecordingStrip {
    pub pixels: [Rgb; PIXELS],
    pub brightness: u8,
    pub pixel_writes: usize,
    pub brightness_writes: usize,
    pub shows: usize,
}

impl RecordingStrip {
    pub const fn new(brightness: u8) -> Self {
        Self {
            pixels: [BLACK; PIXELS],
            brightness,
            pixel_writes: 0,
            brightness_writes: 0,
            shows: 0,
        }
    }
}

impl PixelStrip for RecordingStrip {
    fn set_pixel_color(&mut self, index: u16, color: Rgb) {
        self.pixel_writes += 1;
        if let Some(pixel) = self.pixels.get_mut(usize::from(index)) {
            *pixel = color;
        }
    }

    fn pixel_color(&self, index: u16) -> Rgb {
        self.pixels.get(usize::from(index)).copied().unwrap_or(BLACK)
    }

    fn show(&mut self) {
        self.shows += 1;
    }
}

impl GlobalBrightness for RecordingStrip {
    fn set_brightness(&mut self, brightness: u8) {
        self.brightness_writes += 1;
        self.brightness = brightness;
    }

    fn brightness(&self) -> u8 {
        self.brightness
    }
}

/// Strip, scheduler and engines wired together, driven by a virtual clock
pub struct Rig {
    pub strip: &'static SharedStrip<RecordingStrip>,
    pub scheduler: &'static TestScheduler,
}

impl Rig {
    pub fn new(brightness: u8) -> Self {
        Self {
            strip: Box::leak(Box::new(SharedStrip::new(RecordingStrip::new(brightness)))),
            scheduler: Box::leak(Box::new(TickScheduler::new())),
        }
    }

    pub fn engine(&self, index: u16) -> &'static TestEngine {
        Box::leak(Box::new(EffectEngine::new(self.strip, self.scheduler, index)))
    }

    /// Poll the scheduler at `ms`
    pub fn poll(&self, ms: u64) {
        self.scheduler.poll(Instant::from_millis(ms));
    }

    /// Poll every 10ms from `from_ms` to `to_ms`, both included
    pub fn run(&self, from_ms: u64, to_ms: u64) {
        let mut ms = from_ms;
        while ms <= to_ms {
            self.poll(ms);
            ms += 10;
        }
    }

    pub fn pixel(&self, index: u16) -> Rgb {
        self.strip.lock(|strip| strip.pixel_color(index))
    }

    pub fn brightness(&self) -> u8 {
        self.strip.lock(|strip| strip.brightness)
    }

    pub fn pixel_writes(&self) -> usize {
        self.strip.lock(|strip| strip.pixel_writes)
    }

    pub fn shows(&self) -> usize {
        self.strip.lock(|strip| strip.shows)
    }
}
