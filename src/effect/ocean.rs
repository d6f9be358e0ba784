//! Ocean swell: two interfering sine waves travelling out of the center.

use super::{Effect, EffectCategory, EffectContext, EffectMetadata, InitError, ParameterDescriptor};
use crate::math8::unit_to_u8;

const PARAMS: &[ParameterDescriptor] = &[
    ParameterDescriptor::new("wavelength", 4.0, 80.0, 24.0).with_unit("led"),
];

#[derive(Debug, Clone)]
pub struct OceanEffect {
    phase_a: f32,
    phase_b: f32,
    wavelength: f32,
}

impl Default for OceanEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl OceanEffect {
    pub const fn new() -> Self {
        Self {
            phase_a: 0.0,
            phase_b: 0.0,
            wavelength: 24.0,
        }
    }
}

impl Effect for OceanEffect {
    fn init(&mut self, _ctx: &mut EffectContext<'_>) -> Result<(), InitError> {
        self.phase_a = 0.0;
        self.phase_b = 0.0;
        Ok(())
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn render(&mut self, ctx: &mut EffectContext<'_>) {
        use core::f32::consts::TAU;

        let dt = ctx.safe_delta_seconds();
        let speed = 0.2 + ctx.speed_unit() * 2.0;
        self.phase_a = libm::fmodf(self.phase_a + dt * speed, 1.0);
        self.phase_b = libm::fmodf(self.phase_b + dt * speed * 0.61, 1.0);

        let k = TAU / self.wavelength.max(1.0);
        for i in 0..ctx.leds.len() {
            let d = ctx.center_pair_distance(i) as f32;
            let a = libm::sinf(d * k - self.phase_a * TAU);
            let b = libm::sinf(d * k * 0.47 - self.phase_b * TAU);
            let swell = (a * 0.6 + b * 0.4 + 1.0) * 0.5;
            let level = 64 + (unit_to_u8(swell) >> 1) + (unit_to_u8(swell) >> 2);
            let index = ctx.params.hue.wrapping_add((d * 1.5) as u8).wrapping_add(unit_to_u8(swell) >> 2);
            ctx.leds[i] = ctx.palette_color(index, level);
        }
    }

    fn metadata(&self) -> EffectMetadata {
        EffectMetadata {
            name: "Ocean",
            description: "Rolling swells from the center",
            category: EffectCategory::Water,
            version: 1,
        }
    }

    fn parameters(&self) -> &'static [ParameterDescriptor] {
        PARAMS
    }

    fn parameter_value(&self, name: &str) -> Option<f32> {
        (name == "wavelength").then_some(self.wavelength)
    }

    fn store_parameter(&mut self, name: &str, value: f32) {
        if name == "wavelength" {
            self.wavelength = value;
        }
    }
}
