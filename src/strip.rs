//! Pixel strip plumbing shared by effect engines.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex};
use smart_leds::{SmartLedsWrite, brightness};

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::color::{BLACK, Rgb};
use crate::{GlobalBrightness, PixelStrip};

/// A strip driver shared between several engines.
///
/// Every engine drives its own pixel index, all of them push the same
/// buffer. The raw mutex `R` decides how access is serialized:
/// [`CriticalSectionRawMutex`] allows sharing the strip with other tasks and
/// interrupts but masks them while the buffer is pushed, `NoopRawMutex`
/// keeps the push interruptible when every engine lives on one executor.
pub struct SharedStrip<D, R: RawMutex = CriticalSectionRawMutex> {
    inner: Mutex<R, RefCell<D>>,
}

impl<D, R: RawMutex> SharedStrip<D, R> {
    /// Wrap a driver
    pub const fn new(driver: D) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(driver)),
        }
    }

    /// Run `f` with exclusive access to the driver
    ///
    /// Must not be nested for the same strip.
    pub fn lock<T>(&self, f: impl FnOnce(&mut D) -> T) -> T {
        self.inner.lock(|driver| f(&mut driver.borrow_mut()))
    }
}

/// Frame buffer of `N` pixels pushed through a `smart-leds` writer.
///
/// Global brightness is applied while writing, the buffered colors stay
/// untouched. Indices past the end are ignored.
pub struct PixelBuffer<W, const N: usize> {
    writer: W,
    pixels: [Rgb; N],
    brightness: u8,
}

impl<W, const N: usize> PixelBuffer<W, N> {
    /// Create a dark buffer at full brightness
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            pixels: [BLACK; N],
            brightness: u8::MAX,
        }
    }

    /// Set the initial brightness
    #[must_use]
    pub const fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = brightness;
        self
    }

    /// Buffered colors, before brightness scaling
    pub const fn pixels(&self) -> &[Rgb; N] {
        &self.pixels
    }

    /// Get a reference to the writer
    pub const fn writer(&self) -> &W {
        &self.writer
    }
}

impl<W, const N: usize> PixelStrip for PixelBuffer<W, N>
where
    W: SmartLedsWrite<Color = Rgb>,
{
    fn set_pixel_color(&mut self, index: u16, color: Rgb) {
        if let Some(pixel) = self.pixels.get_mut(usize::from(index)) {
            *pixel = color;
        }
    }

    fn pixel_color(&self, index: u16) -> Rgb {
        self.pixels
            .get(usize::from(index))
            .copied()
            .unwrap_or(BLACK)
    }

    fn show(&mut self) {
        let frame = brightness(self.pixels.iter().copied(), self.brightness);
        if self.writer.write(frame).is_err() {
            #[cfg(feature = "esp32-log")]
            println!("[PixelBuffer.show] failed to write {} pixels", N);
        }
    }
}

impl<W, const N: usize> GlobalBrightness for PixelBuffer<W, N> {
    fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
    }

    fn brightness(&self) -> u8 {
        self.brightness
    }
}
