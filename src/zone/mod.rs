//! Multi-zone compositing
//!
//! The strip is split into up to [`MAX_ZONES`] symmetric rings around the
//! center pair. Each enabled zone renders its own effect instance into a
//! scratch buffer, which is then scaled by the zone brightness and
//! composited into the output with the zone's [`BlendMode`].

mod blend;
mod layout;
mod preset;

use core::fmt;

use embassy_time::Duration;
use heapless::Vec;

pub use blend::BlendMode;
pub use layout::{
    Layout, LayoutError, LayoutPreset, MAX_ZONES, QUAD_LAYOUT, TRIPLE_LAYOUT, ZoneSegment,
    validate,
};
pub use preset::{ZONE_PRESETS, ZonePreset, preset_name};

use crate::color::{BLACK, Palette, Rgb, scale_color};
use crate::effect::{Effect, EffectContext, FrameInput, FrameTiming, InitError, WorkingSetPool};
use crate::math8::scale8;
use crate::narrative::NarrativeEngine;
use crate::registry::EffectRegistry;

const MIN_ZONE_DELTA_MS: u32 = 1;
const MAX_ZONE_DELTA_MS: u32 = 50;
const MIN_ZONE_SPEED: u8 = 1;
const MAX_ZONE_SPEED: u8 = 100;

/// Composer render time above which a frame is counted as slow
pub const ZONE_TIMING_THRESHOLD: Duration = Duration::from_micros(2000);

/// Why a zone command was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneError {
    InvalidZone(u8),
    UnknownEffect(u8),
    /// Reorder list is not a permutation, or moves the center out of zone 0
    InvalidOrder,
    InvalidPreset(u8),
    Layout(LayoutError),
}

impl fmt::Display for ZoneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidZone(zone) => write!(f, "zone {zone} does not exist"),
            Self::UnknownEffect(id) => write!(f, "effect {id} is not available"),
            Self::InvalidOrder => f.write_str("invalid zone order"),
            Self::InvalidPreset(index) => write!(f, "zone preset {index} does not exist"),
            Self::Layout(err) => write!(f, "invalid layout: {err}"),
        }
    }
}

impl From<LayoutError> for ZoneError {
    fn from(err: LayoutError) -> Self {
        Self::Layout(err)
    }
}

/// Per-zone configuration, mutated by commands and read every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneState {
    pub effect: Option<u8>,
    pub brightness: u8,
    pub speed: u8,
    /// 0 follows the global palette, `n` selects palette `n - 1`
    pub palette: u8,
    pub blend_mode: BlendMode,
    pub enabled: bool,
}

impl ZoneState {
    pub const fn new(
        effect: Option<u8>,
        brightness: u8,
        speed: u8,
        blend_mode: BlendMode,
        enabled: bool,
    ) -> Self {
        Self {
            effect,
            brightness,
            speed,
            palette: 0,
            blend_mode,
            enabled,
        }
    }
}

impl Default for ZoneState {
    fn default() -> Self {
        Self::new(None, 255, 15, BlendMode::Overwrite, false)
    }
}

/// Render time bookkeeping for the composer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZoneTiming {
    pub last_us: u32,
    pub total_us: u64,
    pub frames: u32,
    /// Frames slower than [`ZONE_TIMING_THRESHOLD`]
    pub over_threshold: u32,
}

impl ZoneTiming {
    #[allow(clippy::cast_possible_truncation)]
    pub fn record(&mut self, elapsed: Duration) {
        self.last_us = elapsed.as_micros().min(u64::from(u32::MAX)) as u32;
        self.total_us = self.total_us.saturating_add(elapsed.as_micros());
        self.frames = self.frames.saturating_add(1);
        if elapsed > ZONE_TIMING_THRESHOLD {
            self.over_threshold = self.over_threshold.saturating_add(1);
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn average_us(&self) -> u32 {
        if self.frames == 0 {
            return 0;
        }
        (self.total_us / u64::from(self.frames)).min(u64::from(u32::MAX)) as u32
    }
}

/// Outcome of one composer frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneFrame {
    pub zones_rendered: u8,
    /// Effects whose `init` failed this frame, with the reason
    pub init_failures: Vec<(u8, InitError), MAX_ZONES>,
}

struct Pending<E> {
    id: u8,
    previous: Option<u8>,
    effect: E,
}

/// Effect instance owned by one zone
struct ZoneSlot<E> {
    instance: Option<E>,
    pending: Option<Pending<E>>,
    needs_init: bool,
}

impl<E> Default for ZoneSlot<E> {
    fn default() -> Self {
        Self {
            instance: None,
            pending: None,
            needs_init: false,
        }
    }
}

/// Splits the strip into zones and composites their effects
pub struct ZoneComposer<E: Effect, const LEDS: usize> {
    enabled: bool,
    layout: Layout,
    strip_len: usize,
    zones: [ZoneState; MAX_ZONES],
    slots: [ZoneSlot<E>; MAX_ZONES],
    scratch: [Rgb; LEDS],
    total_ms: u64,
    timing: ZoneTiming,
}

impl<E: Effect, const LEDS: usize> ZoneComposer<E, LEDS> {
    /// Disabled composer with the default layout for `strip_len`
    pub fn new(strip_len: usize) -> Self {
        let mut zones = [ZoneState::default(); MAX_ZONES];
        zones[0].enabled = true;
        Self {
            enabled: false,
            layout: Layout::default_for(strip_len),
            strip_len,
            zones,
            slots: core::array::from_fn(|_| ZoneSlot::default()),
            scratch: [BLACK; LEDS],
            total_ms: 0,
            timing: ZoneTiming::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turn compositing on or off; turning it on re-initializes every zone
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled && !self.enabled {
            for slot in &mut self.slots {
                slot.needs_init = true;
            }
        }
        self.enabled = enabled;
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn zone_count(&self) -> usize {
        self.layout.zone_count()
    }

    pub fn strip_len(&self) -> usize {
        self.strip_len
    }

    pub fn zone(&self, zone: u8) -> Option<&ZoneState> {
        self.zones.get(usize::from(zone))
    }

    pub fn zones(&self) -> &[ZoneState; MAX_ZONES] {
        &self.zones
    }

    pub fn timing(&self) -> &ZoneTiming {
        &self.timing
    }

    pub fn timing_mut(&mut self) -> &mut ZoneTiming {
        &mut self.timing
    }

    /// Replace the layout; nothing changes if validation fails
    ///
    /// Zones beyond the new zone count release their effect instances.
    pub fn set_layout(
        &mut self,
        segments: &[ZoneSegment],
        memory: &mut WorkingSetPool,
    ) -> Result<(), LayoutError> {
        let layout = Layout::new(segments, self.strip_len).inspect_err(|err| {
            engine_log!("[ZoneComposer.set_layout] rejected: {}", err);
        })?;
        self.layout = layout;
        self.release_unused_zones(memory);
        Ok(())
    }

    pub fn set_layout_preset(
        &mut self,
        preset: LayoutPreset,
        memory: &mut WorkingSetPool,
    ) -> Result<(), LayoutError> {
        let layout = Layout::preset(preset, self.strip_len).inspect_err(|err| {
            engine_log!("[ZoneComposer.set_layout_preset] rejected: {}", err);
        })?;
        self.layout = layout;
        self.release_unused_zones(memory);
        Ok(())
    }

    /// Give `zone` a fresh instance of effect `id`
    ///
    /// The instance is initialized on the next rendered frame. If that
    /// fails the zone keeps its previous effect.
    pub fn set_zone_effect<const N: usize>(
        &mut self,
        zone: u8,
        id: u8,
        registry: &EffectRegistry<E, N>,
    ) -> Result<(), ZoneError> {
        let index = Self::index(zone)?;
        if !registry.is_available(id) {
            return Err(ZoneError::UnknownEffect(id));
        }
        let effect = registry.construct(id).ok_or(ZoneError::UnknownEffect(id))?;
        self.stage(index, id, effect);
        Ok(())
    }

    pub fn set_zone_brightness(&mut self, zone: u8, brightness: u8) -> Result<(), ZoneError> {
        self.zones[Self::index(zone)?].brightness = brightness;
        Ok(())
    }

    /// Speed is clamped to 1-100
    pub fn set_zone_speed(&mut self, zone: u8, speed: u8) -> Result<(), ZoneError> {
        self.zones[Self::index(zone)?].speed = speed.clamp(MIN_ZONE_SPEED, MAX_ZONE_SPEED);
        Ok(())
    }

    pub fn set_zone_palette(&mut self, zone: u8, palette: u8) -> Result<(), ZoneError> {
        self.zones[Self::index(zone)?].palette = palette;
        Ok(())
    }

    pub fn set_zone_blend_mode(&mut self, zone: u8, mode: BlendMode) -> Result<(), ZoneError> {
        self.zones[Self::index(zone)?].blend_mode = mode;
        Ok(())
    }

    /// Enable or disable one zone; re-enabling restarts its effect
    pub fn set_zone_enabled(&mut self, zone: u8, enabled: bool) -> Result<(), ZoneError> {
        let index = Self::index(zone)?;
        if enabled && !self.zones[index].enabled {
            self.slots[index].needs_init = true;
        }
        self.zones[index].enabled = enabled;
        Ok(())
    }

    /// Forward a parameter to every zone instance of effect `id`
    ///
    /// Returns how many instances accepted the value.
    pub fn set_effect_parameter(&mut self, id: u8, name: &str, value: f32) -> usize {
        let mut updated = 0;
        for (state, slot) in self.zones.iter().zip(self.slots.iter_mut()) {
            if state.effect != Some(id) {
                continue;
            }
            let target = match slot.pending.as_mut() {
                Some(pending) => Some(&mut pending.effect),
                None => slot.instance.as_mut(),
            };
            if let Some(effect) = target {
                if effect.set_parameter(name, value).is_ok() {
                    updated += 1;
                }
            }
        }
        updated
    }

    /// Move zones so that new zone `i` is the old zone `order[i]`
    ///
    /// Segments travel with their configuration and instance. The new zone 0
    /// must still contain the center pair.
    pub fn reorder_zones(&mut self, order: &[u8]) -> Result<(), ZoneError> {
        let count = self.layout.zone_count();
        if order.len() != count {
            return Err(ZoneError::InvalidOrder);
        }
        let mut seen = [false; MAX_ZONES];
        for &source in order {
            let source = usize::from(source);
            if source >= count || seen[source] {
                return Err(ZoneError::InvalidOrder);
            }
            seen[source] = true;
        }
        let first = order
            .first()
            .and_then(|zone| self.layout.segment(*zone))
            .ok_or(ZoneError::InvalidOrder)?;
        if !first.contains_center(self.strip_len) {
            engine_log!("[ZoneComposer.reorder_zones] zone 0 would miss the center");
            return Err(ZoneError::InvalidOrder);
        }

        let states = self.zones;
        let mut slots: [ZoneSlot<E>; MAX_ZONES] =
            core::array::from_fn(|i| core::mem::take(&mut self.slots[i]));
        for (position, &source) in order.iter().enumerate() {
            let source = usize::from(source);
            self.zones[position] = states[source];
            self.slots[position] = core::mem::take(&mut slots[source]);
        }
        self.layout.reorder(order);
        Ok(())
    }

    /// Apply one of [`ZONE_PRESETS`]
    ///
    /// Every effect the preset names must be available, otherwise nothing
    /// changes.
    pub fn load_preset<const N: usize>(
        &mut self,
        index: u8,
        registry: &mut EffectRegistry<E, N>,
    ) -> Result<(), ZoneError> {
        let preset = ZONE_PRESETS
            .get(usize::from(index))
            .ok_or(ZoneError::InvalidPreset(index))?;
        let layout = Layout::preset(preset.layout, self.strip_len)?;
        for state in &preset.zones {
            if let Some(id) = state.effect {
                if !registry.is_available(id) {
                    return Err(ZoneError::UnknownEffect(id));
                }
            }
        }

        self.layout = layout;
        for (zone, state) in preset.zones.iter().enumerate() {
            let staged = state
                .effect
                .and_then(|id| registry.construct(id).map(|effect| (id, effect)));
            match staged {
                Some((id, effect)) => self.stage(zone, id, effect),
                None => self.clear_slot(zone, registry.memory_mut()),
            }
            self.zones[zone] = ZoneState {
                effect: self.zones[zone].effect,
                ..*state
            };
            self.slots[zone].needs_init = true;
        }
        self.release_unused_zones(registry.memory_mut());
        engine_log!("[ZoneComposer.load_preset] loaded {}", preset.name);
        Ok(())
    }

    /// Composite every enabled zone into `output`
    ///
    /// A disabled composer returns immediately and leaves `output` as it was.
    pub fn render<'p>(
        &mut self,
        output: &mut [Rgb],
        frame: &FrameInput<'p>,
        palettes: &'p [Palette],
        narrative: &NarrativeEngine,
        memory: &mut WorkingSetPool,
    ) -> ZoneFrame {
        let mut report = ZoneFrame::default();
        if !self.enabled {
            return report;
        }

        let delta_ms = frame
            .timing
            .delta_ms
            .clamp(MIN_ZONE_DELTA_MS, MAX_ZONE_DELTA_MS);
        self.total_ms += u64::from(delta_ms);
        let timing = FrameTiming {
            delta_ms,
            frame_number: frame.timing.frame_number,
            total_ms: self.total_ms,
        };

        let count = output.len().min(LEDS);
        let strip_len = self.strip_len.max(1);
        let strips = count.div_ceil(strip_len);
        output[..count].fill(BLACK);

        for (index, segment) in self.layout.segments().iter().enumerate() {
            let state = self.zones[index];
            if !state.enabled {
                continue;
            }
            let scratch = &mut self.scratch[..count];
            for_each_zone_led(segment, strips, strip_len, count, |led| scratch[led] = BLACK);

            let palette = zone_palette(state.palette, frame.palette, palettes);
            let mut input = frame.for_zone(*segment).with_palette(palette);
            input.params.brightness = scale8(frame.params.brightness, state.brightness);
            input.params.speed = state.speed;
            input.timing = timing;

            let slot = &mut self.slots[index];
            if let Some(pending) = slot.pending.take() {
                let mut effect = pending.effect;
                let mut ctx = EffectContext::new(&mut *scratch, &input, narrative, &mut *memory);
                match effect.init(&mut ctx) {
                    Ok(()) => {
                        if let Some(mut old) = slot.instance.replace(effect) {
                            old.cleanup(memory);
                        }
                        slot.needs_init = false;
                    }
                    Err(err) => {
                        engine_log!(
                            "[ZoneComposer.render] zone {} effect {} init failed: {}",
                            index,
                            pending.id,
                            err
                        );
                        effect.cleanup(memory);
                        self.zones[index].effect = pending.previous;
                        let _ = report.init_failures.push((pending.id, err));
                    }
                }
            }
            if slot.needs_init {
                slot.needs_init = false;
                if let Some(effect) = slot.instance.as_mut() {
                    effect.cleanup(memory);
                    let mut ctx =
                        EffectContext::new(&mut *scratch, &input, narrative, &mut *memory);
                    if let Err(err) = effect.init(&mut ctx) {
                        engine_log!("[ZoneComposer.render] zone {} re-init failed: {}", index, err);
                        if let Some(id) = self.zones[index].effect {
                            let _ = report.init_failures.push((id, err));
                        }
                        self.zones[index].effect = None;
                        slot.instance = None;
                    }
                }
            }
            let Some(effect) = slot.instance.as_mut() else {
                continue;
            };

            {
                let mut ctx = EffectContext::new(&mut *scratch, &input, narrative, &mut *memory);
                effect.render(&mut ctx);
            }

            for_each_zone_led(segment, strips, strip_len, count, |led| {
                let pixel = scale_color(scratch[led], state.brightness);
                output[led] = state.blend_mode.apply(output[led], pixel, state.brightness);
            });
            report.zones_rendered += 1;
        }
        report
    }

    fn index(zone: u8) -> Result<usize, ZoneError> {
        let index = usize::from(zone);
        if index < MAX_ZONES {
            Ok(index)
        } else {
            Err(ZoneError::InvalidZone(zone))
        }
    }

    /// Drop the instances of zones the current layout no longer covers
    fn release_unused_zones(&mut self, memory: &mut WorkingSetPool) {
        for index in self.layout.zone_count()..MAX_ZONES {
            if self.slots[index].instance.is_some() || self.slots[index].pending.is_some() {
                engine_log!("[ZoneComposer.release_unused_zones] releasing zone {}", index);
            }
            self.clear_slot(index, memory);
        }
    }

    fn clear_slot(&mut self, index: usize, memory: &mut WorkingSetPool) {
        let slot = &mut self.slots[index];
        if let Some(mut pending) = slot.pending.take() {
            pending.effect.cleanup(memory);
        }
        if let Some(mut effect) = slot.instance.take() {
            effect.cleanup(memory);
        }
        self.zones[index].effect = None;
    }

    fn stage(&mut self, index: usize, id: u8, effect: E) {
        let previous = match self.slots[index].pending.take() {
            Some(pending) => pending.previous,
            None => self.zones[index].effect,
        };
        self.zones[index].effect = Some(id);
        self.slots[index].pending = Some(Pending {
            id,
            previous,
            effect,
        });
    }
}

/// Palette for a zone: 0 inherits, otherwise a 1-based index into `palettes`
fn zone_palette<'p>(selector: u8, global: &'p Palette, palettes: &'p [Palette]) -> &'p Palette {
    match selector {
        0 => global,
        n => palettes.get(usize::from(n - 1)).unwrap_or(global),
    }
}

/// Visit every buffer index of `segment` on every physical strip
fn for_each_zone_led(
    segment: &ZoneSegment,
    strips: usize,
    strip_len: usize,
    count: usize,
    mut f: impl FnMut(usize),
) {
    for strip in 0..strips {
        let base = strip * strip_len;
        for local in segment.left_range().chain(segment.right_range()) {
            let led = base + local;
            if led < count {
                f(led);
            }
        }
    }
}
