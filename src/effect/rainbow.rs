//! Center-out rainbow
//!
//! Hue is a function of the distance from the center pair, so both halves
//! of every strip are mirror images and the bands travel outward.

use super::{Effect, EffectCategory, EffectContext, EffectMetadata, InitError, ParameterDescriptor};
use crate::color::hsv;

const PARAMS: &[ParameterDescriptor] = &[
    ParameterDescriptor::new("density", 1.0, 16.0, 3.0)
        .with_step(1.0)
        .with_unit("hue/led"),
    ParameterDescriptor::new("inward", 0.0, 1.0, 0.0).with_step(1.0),
];

/// Hue steps per second at speed 1
const HUE_RATE: f32 = 6.0;

#[derive(Debug, Clone)]
pub struct RainbowEffect {
    /// Accumulated hue offset (fractional)
    offset: f32,
    density: u8,
    inward: bool,
}

impl Default for RainbowEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl RainbowEffect {
    pub const fn new() -> Self {
        Self {
            offset: 0.0,
            density: 3,
            inward: false,
        }
    }

    #[must_use]
    pub const fn with_density(mut self, density: u8) -> Self {
        self.density = density;
        self
    }
}

impl Effect for RainbowEffect {
    fn init(&mut self, _ctx: &mut EffectContext<'_>) -> Result<(), InitError> {
        self.offset = 0.0;
        Ok(())
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn render(&mut self, ctx: &mut EffectContext<'_>) {
        if ctx.leds.is_empty() {
            return;
        }

        let step = HUE_RATE * f32::from(ctx.params.speed) * ctx.safe_delta_seconds();
        self.offset = libm::fmodf(self.offset + step, 256.0);
        let base = (self.offset as u8).wrapping_add(ctx.params.hue);

        for i in 0..ctx.leds.len() {
            // 8-bit wrap of the hue index is intended
            let spread = (ctx.center_pair_distance(i) as u32 * u32::from(self.density)) as u8;
            let hue = if self.inward {
                base.wrapping_add(spread)
            } else {
                base.wrapping_sub(spread)
            };
            ctx.leds[i] = hsv(hue, ctx.params.saturation, ctx.params.brightness);
        }
    }

    fn metadata(&self) -> EffectMetadata {
        EffectMetadata {
            name: "Rainbow",
            description: "Rainbow bands radiating from the center",
            category: EffectCategory::Ambient,
            version: 2,
        }
    }

    fn parameters(&self) -> &'static [ParameterDescriptor] {
        PARAMS
    }

    fn parameter_value(&self, name: &str) -> Option<f32> {
        match name {
            "density" => Some(f32::from(self.density)),
            "inward" => Some(if self.inward { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn store_parameter(&mut self, name: &str, value: f32) {
        match name {
            "density" => self.density = value as u8,
            "inward" => self.inward = value >= 0.5,
            _ => {}
        }
    }
}
