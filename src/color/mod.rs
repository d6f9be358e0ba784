mod palette;

pub use palette::{FOREST, HEAT, OCEAN, PALETTE_SIZE, PALETTES, Palette, RAINBOW};
pub use smart_leds::hsv::hsv2rgb;
use smart_leds::{RGB8, hsv::Hsv as HSV};

use crate::math8::{blend8, qadd8, qsub8, scale8};

pub type Rgb = RGB8;
pub type Hsv = HSV;

/// Pure black, the cleared state of every buffer
pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

/// Blend two RGB colors
///
/// # Arguments
/// * `a` - First color
/// * `b` - Second color
/// * `amount_of_b` - Blend factor (0 = all a, 255 = all b)
#[inline]
pub fn blend_colors(a: Rgb, b: Rgb, amount_of_b: u8) -> Rgb {
    Rgb {
        r: blend8(a.r, b.r, amount_of_b),
        g: blend8(a.g, b.g, amount_of_b),
        b: blend8(a.b, b.b, amount_of_b),
    }
}

/// Scale every channel of a color (`nscale8`)
#[inline]
pub fn scale_color(color: Rgb, scale: u8) -> Rgb {
    Rgb {
        r: scale8(color.r, scale),
        g: scale8(color.g, scale),
        b: scale8(color.b, scale),
    }
}

/// Per-channel saturating add
#[inline]
pub fn add_colors(a: Rgb, b: Rgb) -> Rgb {
    Rgb {
        r: qadd8(a.r, b.r),
        g: qadd8(a.g, b.g),
        b: qadd8(a.b, b.b),
    }
}

/// Per-channel saturating subtract
#[inline]
pub fn subtract_colors(a: Rgb, b: Rgb) -> Rgb {
    Rgb {
        r: qsub8(a.r, b.r),
        g: qsub8(a.g, b.g),
        b: qsub8(a.b, b.b),
    }
}

/// Dim every LED towards black by `amount` (0 = untouched, 255 = black)
pub fn fade_to_black(leds: &mut [Rgb], amount: u8) {
    let keep = 255 - amount;
    for led in leds {
        *led = scale_color(*led, keep);
    }
}

/// Hue/saturation/value shorthand used by the effects
#[inline]
pub fn hsv(hue: u8, sat: u8, val: u8) -> Rgb {
    hsv2rgb(Hsv { hue, sat, val })
}

/// Create an RGB color from a u32 value (0xRRGGBB format)
#[allow(clippy::cast_possible_truncation)]
pub const fn rgb_from_u32(color: u32) -> Rgb {
    Rgb {
        r: ((color >> 16) & 0xFF) as u8,
        g: ((color >> 8) & 0xFF) as u8,
        b: (color & 0xFF) as u8,
    }
}
