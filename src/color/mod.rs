mod utils;
mod wheel;

use smart_leds::RGB8;
pub use utils::{rgb_from_u32, rgb_to_u32};
pub use wheel::wheel;

pub type Rgb = RGB8;

/// Pixel "off" value
pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
