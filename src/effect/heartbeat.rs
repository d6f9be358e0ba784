//! Lub-dub heartbeat
//!
//! Two pulses per beat leave the center pair, the second one weaker.

use super::{Effect, EffectCategory, EffectContext, EffectMetadata, InitError, ParameterDescriptor};
use crate::color::{fade_to_black, hsv};
use crate::geometry::max_center_distance;
use crate::math8::unit_to_u8;

const PARAMS: &[ParameterDescriptor] =
    &[ParameterDescriptor::new("bpm", 30.0, 180.0, 60.0).with_unit("bpm")];

/// Offset of the second pulse within one beat
const DUB_OFFSET: f32 = 0.18;
const PULSE_WIDTH: f32 = 5.0;

#[derive(Debug, Clone)]
pub struct HeartbeatEffect {
    beat_phase: f32,
    bpm: f32,
}

impl Default for HeartbeatEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl HeartbeatEffect {
    pub const fn new() -> Self {
        Self {
            beat_phase: 0.0,
            bpm: 60.0,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn pulse(distance: f32, phase: f32, reach: f32, strength: f32) -> f32 {
        if !(0.0..1.0).contains(&phase) {
            return 0.0;
        }
        let radius = phase * reach;
        let gap = libm::fabsf(distance - radius);
        if gap >= PULSE_WIDTH {
            return 0.0;
        }
        (1.0 - gap / PULSE_WIDTH) * strength * (1.0 - phase)
    }
}

impl Effect for HeartbeatEffect {
    fn init(&mut self, ctx: &mut EffectContext<'_>) -> Result<(), InitError> {
        self.beat_phase = 0.0;
        ctx.fill(crate::color::BLACK);
        Ok(())
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn render(&mut self, ctx: &mut EffectContext<'_>) {
        // Speed nudges the tempo around the configured bpm
        let tempo = self.bpm * (0.5 + ctx.speed_unit());
        self.beat_phase =
            libm::fmodf(self.beat_phase + ctx.safe_delta_seconds() * tempo / 60.0, 1.0);

        fade_to_black(ctx.leds, ctx.params.fade_amount.saturating_mul(2));

        let reach = max_center_distance(ctx.strip_len) as f32 * 0.6;
        let lub = self.beat_phase * 2.0;
        let dub = (self.beat_phase - DUB_OFFSET) * 2.0;
        for i in 0..ctx.leds.len() {
            let d = ctx.center_pair_distance(i) as f32;
            let level = Self::pulse(d, lub, reach, 1.0).max(Self::pulse(d, dub, reach, 0.6));
            if level <= 0.0 {
                continue;
            }
            let color = hsv(
                ctx.params.hue.wrapping_sub(8),
                ctx.params.saturation,
                crate::math8::scale8(unit_to_u8(level), ctx.params.brightness),
            );
            let led = &mut ctx.leds[i];
            led.r = led.r.max(color.r);
            led.g = led.g.max(color.g);
            led.b = led.b.max(color.b);
        }
    }

    fn metadata(&self) -> EffectMetadata {
        EffectMetadata {
            name: "Heartbeat",
            description: "Double pulse from the center",
            category: EffectCategory::Rhythmic,
            version: 1,
        }
    }

    fn parameters(&self) -> &'static [ParameterDescriptor] {
        PARAMS
    }

    fn parameter_value(&self, name: &str) -> Option<f32> {
        (name == "bpm").then_some(self.bpm)
    }

    fn store_parameter(&mut self, name: &str, value: f32) {
        if name == "bpm" {
            self.bpm = value;
        }
    }
}
