//! Slow breathing glow that follows the narrative conductor when enabled.

use super::{Effect, EffectCategory, EffectContext, EffectMetadata, InitError, ParameterDescriptor};
use crate::math8::{lerp_f32, unit_to_u8};

const PARAMS: &[ParameterDescriptor] = &[
    ParameterDescriptor::new("depth", 0.0, 1.0, 0.8).with_step(0.05),
    ParameterDescriptor::new("follow_narrative", 0.0, 1.0, 1.0).with_step(1.0),
];

#[derive(Debug, Clone)]
pub struct BreathingEffect {
    phase: f32,
    depth: f32,
    follow_narrative: bool,
}

impl Default for BreathingEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl BreathingEffect {
    pub const fn new() -> Self {
        Self {
            phase: 0.0,
            depth: 0.8,
            follow_narrative: true,
        }
    }
}

impl Effect for BreathingEffect {
    fn init(&mut self, _ctx: &mut EffectContext<'_>) -> Result<(), InitError> {
        self.phase = 0.0;
        Ok(())
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn render(&mut self, ctx: &mut EffectContext<'_>) {
        let narrative = ctx.narrative();
        let breath = if self.follow_narrative && narrative.is_enabled() {
            narrative.intensity(ctx.zone_id())
        } else {
            let rate = 0.05 + ctx.speed_unit() * 0.5;
            self.phase = libm::fmodf(self.phase + ctx.safe_delta_seconds() * rate, 1.0);
            (1.0 - libm::cosf(self.phase * core::f32::consts::TAU)) * 0.5
        };
        let level = lerp_f32(1.0 - self.depth, 1.0, breath);

        for i in 0..ctx.leds.len() {
            // Slightly brighter core
            let glow = 1.0 - ctx.normalized_distance(i) * 0.35;
            let index = ctx.params.hue.wrapping_add((ctx.center_pair_distance(i) as u32 & 0x3F) as u8);
            ctx.leds[i] = ctx.palette_color(index, unit_to_u8(level * glow));
        }
    }

    fn metadata(&self) -> EffectMetadata {
        EffectMetadata {
            name: "Breathing",
            description: "Slow swell of light, narrative aware",
            category: EffectCategory::Ambient,
            version: 1,
        }
    }

    fn parameters(&self) -> &'static [ParameterDescriptor] {
        PARAMS
    }

    fn parameter_value(&self, name: &str) -> Option<f32> {
        match name {
            "depth" => Some(self.depth),
            "follow_narrative" => Some(if self.follow_narrative { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    fn store_parameter(&mut self, name: &str, value: f32) {
        match name {
            "depth" => self.depth = value,
            "follow_narrative" => self.follow_narrative = value >= 0.5,
            _ => {}
        }
    }
}
