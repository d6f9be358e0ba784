//! Rings expanding outward from the center pair.

use super::{Effect, EffectCategory, EffectContext, EffectMetadata, InitError, ParameterDescriptor};
use crate::geometry::max_center_distance;
use crate::math8::unit_to_u8;

const PARAMS: &[ParameterDescriptor] = &[
    ParameterDescriptor::new("ring_width", 1.0, 20.0, 6.0).with_unit("led"),
    ParameterDescriptor::new("rings", 1.0, 4.0, 2.0).with_step(1.0),
];

#[derive(Debug, Clone)]
pub struct CenterPulseEffect {
    /// Position of the leading ring, 0.0..1.0 of the strip half
    phase: f32,
    ring_width: f32,
    rings: u8,
}

impl Default for CenterPulseEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl CenterPulseEffect {
    pub const fn new() -> Self {
        Self {
            phase: 0.0,
            ring_width: 6.0,
            rings: 2,
        }
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }
}

impl Effect for CenterPulseEffect {
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
        let rate = 0.1 + ctx.speed_unit() * 1.5;
        self.phase = libm::fmodf(self.phase + ctx.safe_delta_seconds() * rate, 1.0);

        let reach = max_center_distance(ctx.strip_len) as f32 + self.ring_width;
        let rings = f32::from(self.rings.max(1));
        for i in 0..ctx.leds.len() {
            let d = ctx.center_pair_distance(i) as f32;
            let mut level = 0.0f32;
            for ring in 0..self.rings.max(1) {
                let offset = libm::fmodf(self.phase + f32::from(ring) / rings, 1.0);
                let radius = offset * reach;
                let gap = libm::fabsf(d - radius);
                if gap < self.ring_width {
                    let falloff = 1.0 - gap / self.ring_width;
                    level = level.max(falloff * falloff * (1.0 - offset * 0.5));
                }
            }
            let index = ctx.params.hue.wrapping_add((d * 2.0) as u8);
            ctx.leds[i] = ctx.palette_color(index, unit_to_u8(level));
        }
    }

    fn metadata(&self) -> EffectMetadata {
        EffectMetadata {
            name: "Center Pulse",
            description: "Concentric rings leaving the center pair",
            category: EffectCategory::Geometric,
            version: 1,
        }
    }

    fn parameters(&self) -> &'static [ParameterDescriptor] {
        PARAMS
    }

    fn parameter_value(&self, name: &str) -> Option<f32> {
        match name {
            "ring_width" => Some(self.ring_width),
            "rings" => Some(f32::from(self.rings)),
            _ => None,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn store_parameter(&mut self, name: &str, value: f32) {
        match name {
            "ring_width" => self.ring_width = value,
            "rings" => self.rings = value as u8,
            _ => {}
        }
    }
}
