//! Confetti sparks scattered symmetrically around the center pair.

use super::{Effect, EffectCategory, EffectContext, EffectMetadata, InitError, ParameterDescriptor};
use crate::color::{add_colors, fade_to_black, hsv};
use crate::random::FastRng;

const PARAMS: &[ParameterDescriptor] = &[
    ParameterDescriptor::new("density", 1.0, 8.0, 2.0).with_step(1.0).with_unit("spark/frame"),
];

#[derive(Debug, Clone)]
pub struct ConfettiEffect {
    density: u8,
    frame: u32,
}

impl Default for ConfettiEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfettiEffect {
    pub const fn new() -> Self {
        Self {
            density: 2,
            frame: 0,
        }
    }
}

impl Effect for ConfettiEffect {
    fn init(&mut self, ctx: &mut EffectContext<'_>) -> Result<(), InitError> {
        self.frame = 0;
        ctx.fill(crate::color::BLACK);
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn render(&mut self, ctx: &mut EffectContext<'_>) {
        let len = ctx.leds.len();
        if len == 0 {
            return;
        }
        self.frame = self.frame.wrapping_add(1);
        fade_to_black(ctx.leds, ctx.params.fade_amount);

        let mut rng = FastRng::new(ctx.seed ^ self.frame.wrapping_mul(0x9e37_79b9));
        let sparks = u32::from(self.density) + u32::from(ctx.params.intensity >> 6);
        let spread = (ctx.params.variation >> 1).max(1);
        for _ in 0..sparks {
            let index = rng.below(len as u32) as usize;
            let hue = ctx
                .params
                .hue
                .wrapping_add((rng.below(u32::from(spread))) as u8);
            let color = hsv(hue, ctx.params.saturation.min(200), ctx.params.brightness);
            let mirror = ctx.mirror_index(index);
            for target in [index, mirror] {
                if let Some(led) = ctx.leds.get_mut(target) {
                    *led = add_colors(*led, color);
                }
            }
        }
    }

    fn metadata(&self) -> EffectMetadata {
        EffectMetadata {
            name: "Confetti",
            description: "Random mirrored sparks",
            category: EffectCategory::Particle,
            version: 1,
        }
    }

    fn parameters(&self) -> &'static [ParameterDescriptor] {
        PARAMS
    }

    fn parameter_value(&self, name: &str) -> Option<f32> {
        (name == "density").then_some(f32::from(self.density))
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn store_parameter(&mut self, name: &str, value: f32) {
        if name == "density" {
            self.density = value as u8;
        }
    }
}
