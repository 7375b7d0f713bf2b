//! 8-bit color wheel
//!
//! Maps a wheel position to a fully saturated hue. The position is inverted
//! first, then split into three 85-wide bands, so walking the input from
//! 0 to 255 goes red -> green -> blue -> red in steps of at most 3 per
//! channel.

use crate::color::Rgb;

const BAND_WIDTH: u8 = 85;

/// Get the color at `position` on the wheel
pub const fn wheel(position: u8) -> Rgb {
    let position = 255 - position;
    if position < BAND_WIDTH {
        return Rgb {
            r: 255 - position * 3,
            g: 0,
            b: position * 3,
        };
    }
    if position < BAND_WIDTH * 2 {
        let position = position - BAND_WIDTH;
        return Rgb {
            r: 0,
            g: position * 3,
            b: 255 - position * 3,
        };
    }
    let position = position - BAND_WIDTH * 2;
    Rgb {
        r: position * 3,
        g: 255 - position * 3,
        b: 0,
    }
}
