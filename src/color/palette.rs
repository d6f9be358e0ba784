//! 16-entry color tables sampled with linear blending.
//!
//! Palette contents are supplied by the caller; the four tables here are the
//! defaults the engine falls back to when no table is configured.

use super::{Rgb, blend_colors, rgb_from_u32, scale_color};

/// Number of entries in a palette
pub const PALETTE_SIZE: usize = 16;

/// A 16-entry gradient palette
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    entries: [Rgb; PALETTE_SIZE],
}

impl Palette {
    pub const fn new(entries: [Rgb; PALETTE_SIZE]) -> Self {
        Self { entries }
    }

    const fn from_hex(hex: [u32; PALETTE_SIZE]) -> Self {
        let mut entries = [Rgb { r: 0, g: 0, b: 0 }; PALETTE_SIZE];
        let mut i = 0;
        while i < PALETTE_SIZE {
            entries[i] = rgb_from_u32(hex[i]);
            i += 1;
        }
        Self { entries }
    }

    pub const fn entries(&self) -> &[Rgb; PALETTE_SIZE] {
        &self.entries
    }

    /// Sample the palette at `index` (0-255 spans the table and wraps back
    /// to the first entry) and scale it by `brightness`.
    pub fn color_at(&self, index: u8, brightness: u8) -> Rgb {
        let slot = usize::from(index >> 4);
        let frac = (index & 0x0F) << 4;
        let current = self.entries[slot];
        let next = self.entries[(slot + 1) % PALETTE_SIZE];
        let color = if frac == 0 {
            current
        } else {
            blend_colors(current, next, frac)
        };
        if brightness == 255 {
            color
        } else {
            scale_color(color, brightness)
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        RAINBOW
    }
}

pub const RAINBOW: Palette = Palette::from_hex([
    0xFF0000, 0xD52A00, 0xAB5500, 0xAB7F00, 0xABAB00, 0x56D500, 0x00FF00, 0x00D52A,
    0x00AB55, 0x0056AA, 0x0000FF, 0x2A00D5, 0x5500AB, 0x7F0081, 0xAB0055, 0xD5002B,
]);

pub const HEAT: Palette = Palette::from_hex([
    0x000000, 0x330000, 0x660000, 0x990000, 0xCC0000, 0xFF0000, 0xFF3300, 0xFF6600,
    0xFF9900, 0xFFCC00, 0xFFFF00, 0xFFFF33, 0xFFFF66, 0xFFFF99, 0xFFFFCC, 0xFFFFFF,
]);

pub const OCEAN: Palette = Palette::from_hex([
    0x191970, 0x00008B, 0x191970, 0x000080, 0x00008B, 0x0000CD, 0x2E8B57, 0x008080,
    0x5F9EA0, 0x0000FF, 0x008B8B, 0x6495ED, 0x7FFFD4, 0x2E8B57, 0x00FFFF, 0x87CEFA,
]);

pub const FOREST: Palette = Palette::from_hex([
    0x006400, 0x006400, 0x556B2F, 0x006400, 0x008000, 0x228B22, 0x6B8E23, 0x008000,
    0x2E8B57, 0x66CDAA, 0x32CD32, 0x9ACD32, 0x90EE90, 0x7CFC00, 0x66CDAA, 0x228B22,
]);

/// Built-in palette table, indexed by palette commands
pub static PALETTES: [Palette; 4] = [RAINBOW, HEAT, OCEAN, FOREST];
