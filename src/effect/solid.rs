//! Solid color fill
//!
//! Fills every LED with one hue. The hue eases towards its target so
//! parameter changes do not snap.

use super::{Effect, EffectCategory, EffectContext, EffectMetadata, InitError, ParameterDescriptor};
use crate::color::hsv;
use crate::math8::blend8;

const PARAMS: &[ParameterDescriptor] = &[
    ParameterDescriptor::new("hue", 0.0, 255.0, 0.0).with_step(1.0),
    ParameterDescriptor::new("follow_global_hue", 0.0, 1.0, 0.0).with_step(1.0),
];

/// Hue easing per frame (0-255)
const HUE_EASE: u8 = 48;

#[derive(Debug, Clone)]
pub struct SolidEffect {
    target_hue: u8,
    current_hue: u8,
    follow_global: bool,
}

impl Default for SolidEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl SolidEffect {
    pub const fn new() -> Self {
        Self {
            target_hue: 0,
            current_hue: 0,
            follow_global: false,
        }
    }

    #[must_use]
    pub const fn with_hue(mut self, hue: u8) -> Self {
        self.target_hue = hue;
        self.current_hue = hue;
        self
    }
}

impl Effect for SolidEffect {
    fn init(&mut self, _ctx: &mut EffectContext<'_>) -> Result<(), InitError> {
        self.current_hue = self.target_hue;
        Ok(())
    }

    fn render(&mut self, ctx: &mut EffectContext<'_>) {
        let target = if self.follow_global {
            self.target_hue.wrapping_add(ctx.params.hue)
        } else {
            self.target_hue
        };
        self.current_hue = blend8(self.current_hue, target, HUE_EASE);
        if self.current_hue.abs_diff(target) <= 2 {
            self.current_hue = target;
        }
        let color = hsv(self.current_hue, ctx.params.saturation, ctx.params.brightness);
        ctx.fill(color);
    }

    fn metadata(&self) -> EffectMetadata {
        EffectMetadata {
            name: "Solid",
            description: "Single color fill",
            category: EffectCategory::Utility,
            version: 1,
        }
    }

    fn parameters(&self) -> &'static [ParameterDescriptor] {
        PARAMS
    }

    fn parameter_value(&self, name: &str) -> Option<f32> {
        match name {
            "hue" => Some(f32::from(self.target_hue)),
            "follow_global_hue" => Some(if self.follow_global { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn store_parameter(&mut self, name: &str, value: f32) {
        match name {
            "hue" => self.target_hue = value as u8,
            "follow_global_hue" => self.follow_global = value >= 0.5,
            _ => {}
        }
    }
}
