//! Per-frame view handed to an effect.

use crate::color::{Palette, Rgb};
use crate::geometry::{
    center_of_strip, center_pair_distance, center_pair_signed_position, mirror_index,
    normalized_center_distance,
};
use crate::math8::clamp01;
use crate::narrative::NarrativeEngine;
use crate::random::{FastRng, hash32};
use crate::zone::ZoneSegment;

use super::memory::{BlockHandle, WorkingSetPool};

const MIN_DELTA_SECONDS: f32 = 0.0001;
const MAX_DELTA_SECONDS: f32 = 0.05;

/// Animation parameters shared by every effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationParams {
    pub brightness: u8,
    /// 1-100
    pub speed: u8,
    /// Base hue, advanced by the render actor every frame
    pub hue: u8,
    pub mood: u8,
    pub intensity: u8,
    pub saturation: u8,
    pub complexity: u8,
    pub variation: u8,
    /// Trail fade applied by trail-based effects each frame
    pub fade_amount: u8,
}

impl Default for AnimationParams {
    fn default() -> Self {
        Self {
            brightness: 255,
            speed: 15,
            hue: 0,
            mood: 128,
            intensity: 128,
            saturation: 255,
            complexity: 128,
            variation: 64,
            fade_amount: 20,
        }
    }
}

/// Frame timing information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTiming {
    pub delta_ms: u32,
    pub frame_number: u32,
    pub total_ms: u64,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self {
            delta_ms: 8,
            frame_number: 0,
            total_ms: 0,
        }
    }
}

impl FrameTiming {
    #[allow(clippy::cast_precision_loss)]
    pub fn delta_seconds(&self) -> f32 {
        self.delta_ms as f32 / 1000.0
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn total_seconds(&self) -> f32 {
        self.total_ms as f32 / 1000.0
    }
}

/// Everything needed to build an [`EffectContext`] except the borrows of
/// the buffer, the narrative conductor and the working-set pool
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub palette: &'a Palette,
    pub params: AnimationParams,
    pub timing: FrameTiming,
    /// Length of one physical strip; the buffer may hold several
    pub strip_len: usize,
    /// Frame-local random seed
    pub seed: u32,
    pub zone: Option<ZoneSegment>,
}

impl<'a> FrameInput<'a> {
    /// Same frame, rendered for `zone` with its own seed
    #[must_use]
    pub fn for_zone(mut self, zone: ZoneSegment) -> Self {
        self.seed = hash32(self.seed ^ (u32::from(zone.zone_id) + 1).wrapping_mul(0x2545_f491));
        self.zone = Some(zone);
        self
    }

    #[must_use]
    pub fn with_palette(mut self, palette: &'a Palette) -> Self {
        self.palette = palette;
        self
    }
}

/// Read/write view handed to [`Effect::render`](super::Effect::render)
///
/// The buffer borrow lasts for a single call, so an effect cannot retain it.
pub struct EffectContext<'a> {
    pub leds: &'a mut [Rgb],
    pub palette: &'a Palette,
    pub params: AnimationParams,
    pub timing: FrameTiming,
    pub strip_len: usize,
    pub zone: Option<ZoneSegment>,
    pub seed: u32,
    narrative: &'a NarrativeEngine,
    memory: &'a mut WorkingSetPool,
}

impl<'a> EffectContext<'a> {
    pub fn new(
        leds: &'a mut [Rgb],
        input: &FrameInput<'a>,
        narrative: &'a NarrativeEngine,
        memory: &'a mut WorkingSetPool,
    ) -> Self {
        let strip_len = if input.strip_len == 0 {
            leds.len()
        } else {
            input.strip_len
        };
        Self {
            leds,
            palette: input.palette,
            params: input.params,
            timing: input.timing,
            strip_len,
            zone: input.zone,
            seed: input.seed,
            narrative,
            memory,
        }
    }

    /// Number of LEDs in the buffer (all strips)
    pub fn led_count(&self) -> usize {
        self.leds.len()
    }

    /// Number of physical strips in the buffer
    pub fn strip_count(&self) -> usize {
        if self.strip_len == 0 {
            return 0;
        }
        self.leds.len().div_ceil(self.strip_len)
    }

    /// First LED right of the center pair
    pub fn center(&self) -> usize {
        center_of_strip(self.strip_len)
    }

    pub fn center_pair_distance(&self, index: usize) -> usize {
        center_pair_distance(index, self.strip_len)
    }

    pub fn signed_position(&self, index: usize) -> f32 {
        center_pair_signed_position(index, self.strip_len)
    }

    /// Distance from the center pair in 0.0..=1.0
    pub fn normalized_distance(&self, index: usize) -> f32 {
        normalized_center_distance(index, self.strip_len)
    }

    pub fn mirror_index(&self, index: usize) -> usize {
        mirror_index(index, self.strip_len)
    }

    /// Phase (0.0..1.0) of an oscillator running at `hz`
    pub fn phase(&self, hz: f32) -> f32 {
        let cycles = self.timing.total_seconds() * hz;
        cycles - libm::floorf(cycles)
    }

    /// Sine oscillator at `hz` in -1.0..=1.0
    pub fn sine_wave(&self, hz: f32) -> f32 {
        libm::sinf(self.phase(hz) * core::f32::consts::TAU)
    }

    /// Frame delta clamped to 0.1-50 ms, safe for physics integration
    pub fn safe_delta_seconds(&self) -> f32 {
        self.timing
            .delta_seconds()
            .clamp(MIN_DELTA_SECONDS, MAX_DELTA_SECONDS)
    }

    /// Speed scaled to 0.0..=1.0
    pub fn speed_unit(&self) -> f32 {
        clamp01(f32::from(self.params.speed) / 100.0)
    }

    pub fn is_zone_render(&self) -> bool {
        self.zone.is_some()
    }

    pub fn zone_id(&self) -> Option<u8> {
        self.zone.map(|zone| zone.zone_id)
    }

    /// Sample the active palette, applying the context brightness on top
    pub fn palette_color(&self, index: u8, brightness: u8) -> Rgb {
        let scaled = crate::math8::scale8(brightness, self.params.brightness);
        self.palette.color_at(index, scaled)
    }

    /// Random generator seeded for this frame and zone
    pub fn rng(&self) -> FastRng {
        FastRng::new(self.seed)
    }

    pub fn narrative(&self) -> &NarrativeEngine {
        self.narrative
    }

    pub fn memory(&mut self) -> &mut WorkingSetPool {
        &mut *self.memory
    }

    /// Borrow the LED buffer together with an acquired working-set block
    pub fn leds_and_block(&mut self, handle: BlockHandle) -> (&mut [Rgb], Option<&mut [u8]>) {
        (&mut *self.leds, self.memory.block_mut(handle))
    }

    /// Fill the whole buffer with one color
    pub fn fill(&mut self, color: Rgb) {
        self.leds.fill(color);
    }
}
