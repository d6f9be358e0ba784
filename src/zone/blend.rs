//! Per-pixel rules for compositing a zone into the output buffer.

use crate::color::{Rgb, add_colors, blend_colors, subtract_colors};
use crate::math8::scale8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlendMode {
    /// output = new
    #[default]
    Overwrite,
    /// Saturating per-channel add
    Additive,
    /// Lerp towards new by the zone brightness
    Alpha,
    Multiply,
    Screen,
    Lighten,
    Darken,
    /// Saturating per-channel subtract of new from output
    Subtract,
}

impl BlendMode {
    pub const ALL: [Self; 8] = [
        Self::Overwrite,
        Self::Additive,
        Self::Alpha,
        Self::Multiply,
        Self::Screen,
        Self::Lighten,
        Self::Darken,
        Self::Subtract,
    ];

    pub fn from_raw(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overwrite => "overwrite",
            Self::Additive => "additive",
            Self::Alpha => "alpha",
            Self::Multiply => "multiply",
            Self::Screen => "screen",
            Self::Lighten => "lighten",
            Self::Darken => "darken",
            Self::Subtract => "subtract",
        }
    }

    /// Combine an already brightness-scaled zone pixel with the output pixel
    pub fn apply(self, output: Rgb, new: Rgb, zone_brightness: u8) -> Rgb {
        match self {
            Self::Overwrite => new,
            Self::Additive => add_colors(output, new),
            Self::Alpha => blend_colors(output, new, zone_brightness),
            Self::Multiply => per_channel(output, new, scale8),
            Self::Screen => per_channel(output, new, |a, b| {
                255 - scale8(255 - a, 255 - b)
            }),
            Self::Lighten => per_channel(output, new, u8::max),
            Self::Darken => per_channel(output, new, u8::min),
            Self::Subtract => subtract_colors(output, new),
        }
    }
}

fn per_channel(a: Rgb, b: Rgb, op: impl Fn(u8, u8) -> u8) -> Rgb {
    Rgb {
        r: op(a.r, b.r),
        g: op(a.g, b.g),
        b: op(a.b, b.b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_additive_saturates() {
        let out = BlendMode::Additive.apply(Rgb::new(200, 100, 0), Rgb::new(100, 100, 255), 255);
        assert_eq!(out, Rgb::new(255, 200, 255));
    }

    #[test]
    fn test_alpha_uses_brightness() {
        let out = BlendMode::Alpha.apply(Rgb::new(0, 0, 0), Rgb::new(200, 200, 200), 0);
        assert_eq!(out, Rgb::new(0, 0, 0));
        let out = BlendMode::Alpha.apply(Rgb::new(0, 0, 0), Rgb::new(200, 200, 200), 255);
        assert_eq!(out, Rgb::new(200, 200, 200));
    }

    #[test]
    fn test_lighten_darken() {
        let a = Rgb::new(10, 200, 50);
        let b = Rgb::new(100, 20, 50);
        assert_eq!(BlendMode::Lighten.apply(a, b, 255), Rgb::new(100, 200, 50));
        assert_eq!(BlendMode::Darken.apply(a, b, 255), Rgb::new(10, 20, 50));
    }
}
