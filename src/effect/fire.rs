//! Center-origin fire
//!
//! A heat simulation per strip half: sparks ignite at the center pair, heat
//! drifts outward and cools. The heat map lives in a working-set block
//! acquired on `init`.

use super::{
    BlockHandle, Effect, EffectCategory, EffectContext, EffectMetadata, InitError,
    ParameterDescriptor, WORKING_SET_BLOCK_LEN, WorkingSetPool,
};
use crate::color::HEAT;
use crate::math8::{qadd8, qsub8, scale8};
use crate::random::FastRng;

const PARAMS: &[ParameterDescriptor] = &[
    ParameterDescriptor::new("cooling", 20.0, 100.0, 55.0).with_step(1.0),
    ParameterDescriptor::new("sparking", 50.0, 200.0, 120.0).with_step(1.0),
];

/// Cells near the center where sparks may ignite
const SPARK_ZONE: usize = 7;

#[derive(Debug, Clone)]
pub struct FireEffect {
    heat: Option<BlockHandle>,
    cooling: u8,
    sparking: u8,
    frame: u32,
}

impl Default for FireEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl FireEffect {
    pub const fn new() -> Self {
        Self {
            heat: None,
            cooling: 55,
            sparking: 120,
            frame: 0,
        }
    }

    /// Advance one half-strip heat column, index 0 at the center
    #[allow(clippy::cast_possible_truncation)]
    fn step_column(column: &mut [u8], cooling: u8, sparking: u8, rng: &mut FastRng) {
        let len = column.len();
        if len == 0 {
            return;
        }
        let max_cool = ((u32::from(cooling) * 10) / len as u32 + 2).min(255) as u8;
        for cell in column.iter_mut() {
            let cool = rng.below(u32::from(max_cool) + 1) as u8;
            *cell = qsub8(*cell, cool);
        }
        for k in (2..len).rev() {
            let sum = u16::from(column[k - 1]) + 2 * u16::from(column[k - 2]);
            column[k] = (sum / 3) as u8;
        }
        if rng.next_u8() < sparking {
            let y = rng.below(SPARK_ZONE.min(len) as u32) as usize;
            column[y] = qadd8(column[y], 160 + rng.next_u8() % 96);
        }
    }
}

impl Effect for FireEffect {
    fn init(&mut self, ctx: &mut EffectContext<'_>) -> Result<(), InitError> {
        let cells = ctx.led_count();
        if cells > WORKING_SET_BLOCK_LEN {
            return Err(InitError::Unsupported);
        }
        match self.heat {
            None => self.heat = Some(ctx.memory().acquire()?),
            Some(handle) => {
                if let Some(block) = ctx.memory().block_mut(handle) {
                    block.fill(0);
                }
            }
        }
        self.frame = 0;
        Ok(())
    }

    fn render(&mut self, ctx: &mut EffectContext<'_>) {
        let Some(handle) = self.heat else {
            ctx.fill(crate::color::BLACK);
            return;
        };
        self.frame = self.frame.wrapping_add(1);
        let mut rng = FastRng::new(ctx.seed ^ self.frame.rotate_left(16));
        let strip_len = ctx.strip_len.max(1);
        let center = ctx.center();
        let brightness = ctx.params.brightness;
        // Higher speed cools faster and sparks more often
        let cooling = scale8(self.cooling, 128 + ctx.params.speed.min(100));
        let sparking = self.sparking;

        let (leds, block) = ctx.leds_and_block(handle);
        let Some(heat) = block else {
            leds.fill(crate::color::BLACK);
            return;
        };
        let heat = &mut heat[..leds.len().min(WORKING_SET_BLOCK_LEN)];

        for (strip_leds, strip_heat) in leds.chunks_mut(strip_len).zip(heat.chunks_mut(strip_len)) {
            let split = center.min(strip_heat.len());
            let (left, right) = strip_heat.split_at_mut(split);
            Self::step_column(left, cooling, sparking, &mut rng);
            Self::step_column(right, cooling, sparking, &mut rng);

            for (i, led) in strip_leds.iter_mut().enumerate() {
                let cell = if i < split {
                    left.get(split - 1 - i).copied()
                } else {
                    right.get(i - split).copied()
                };
                let temperature = scale8(cell.unwrap_or(0), 240);
                *led = HEAT.color_at(temperature, brightness);
            }
        }
    }

    fn cleanup(&mut self, memory: &mut WorkingSetPool) {
        if let Some(handle) = self.heat.take() {
            memory.release(handle);
        }
    }

    fn metadata(&self) -> EffectMetadata {
        EffectMetadata {
            name: "Fire",
            description: "Flames rising out of the center pair",
            category: EffectCategory::Fire,
            version: 2,
        }
    }

    fn parameters(&self) -> &'static [ParameterDescriptor] {
        PARAMS
    }

    fn parameter_value(&self, name: &str) -> Option<f32> {
        match name {
            "cooling" => Some(f32::from(self.cooling)),
            "sparking" => Some(f32::from(self.sparking)),
            _ => None,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn store_parameter(&mut self, name: &str, value: f32) {
        match name {
            "cooling" => self.cooling = value as u8,
            "sparking" => self.sparking = value as u8,
            _ => {}
        }
    }
}
