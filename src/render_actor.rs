//! The fixed-cadence render loop.
//!
//! [`RenderActor`] is the single owner of the output buffer. Each
//! [`tick`](RenderActor::tick) drains a bounded number of commands from the
//! [`EngineBus`], renders one frame (transition, zones or the single active
//! effect), hands it to the [`OutputDriver`] and publishes telemetry.

use core::fmt;

use embassy_time::{Duration, Instant};

use crate::bus::{CommandReceiver, EngineBus, EngineStatus};
use crate::color::{BLACK, Palette, RAINBOW, Rgb};
use crate::command::Command;
use crate::effect::{
    AnimationParams, Effect, EffectContext, FrameInput, FrameTiming, InitError, ParameterError,
};
use crate::geometry::DEFAULT_STRIP_LEN;
use crate::narrative::{NarrativeConfig, NarrativeEngine};
use crate::random::hash32;
use crate::registry::{EffectRegistry, RegistryError};
use crate::stats::{FrameRendered, RenderStats};
use crate::transition::{TransitionEngine, TransitionError, TransitionKind, TransitionStep};
use crate::zone::{LayoutError, ZoneComposer, ZoneError, ZoneSegment};
use crate::{Clock, OutputDriver};

const MIN_SPEED: u8 = 1;
const MAX_SPEED: u8 = 100;

/// Configuration for the render actor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// LEDs on one physical strip
    pub strip_len: usize,
    /// Physical strips sharing the buffer, each `strip_len` long
    pub strip_count: usize,
    /// Effect activated at startup
    pub initial_effect: Option<u8>,
    pub brightness: u8,
    /// Upper bound applied to every brightness command
    pub max_brightness: u8,
    pub speed: u8,
    pub palette: u8,
    /// Frame budget; longer ticks are counted as drops
    pub frame_duration: Duration,
    /// Commands applied per tick, the rest wait for the next frame
    pub max_commands_per_tick: usize,
    /// Base hue advance per frame
    pub hue_step: u8,
    pub narrative: NarrativeConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strip_len: DEFAULT_STRIP_LEN,
            strip_count: 2,
            initial_effect: None,
            brightness: 96,
            max_brightness: 160,
            speed: 10,
            palette: 0,
            frame_duration: Duration::from_micros(8333),
            max_commands_per_tick: 16,
            hue_step: 1,
            narrative: NarrativeConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Total LEDs across all strips
    pub const fn led_count(&self) -> usize {
        self.strip_len * self.strip_count
    }
}

/// Why a command could not be applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApplyError {
    /// The effect is not registered or has been marked unavailable
    UnknownEffect(u8),
    /// The effect failed to initialize and is now unavailable
    InitFailed(u8, InitError),
    InvalidValue,
    Parameter(ParameterError),
    Zone(ZoneError),
    Transition(TransitionError),
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownEffect(id) => write!(f, "effect {id} is not available"),
            Self::InitFailed(id, err) => write!(f, "effect {id} failed to initialize: {err}"),
            Self::InvalidValue => f.write_str("value out of range"),
            Self::Parameter(err) => write!(f, "{err}"),
            Self::Zone(err) => write!(f, "{err}"),
            Self::Transition(err) => write!(f, "{err}"),
        }
    }
}

impl From<ParameterError> for ApplyError {
    fn from(err: ParameterError) -> Self {
        Self::Parameter(err)
    }
}

impl From<ZoneError> for ApplyError {
    fn from(err: ZoneError) -> Self {
        Self::Zone(err)
    }
}

impl From<LayoutError> for ApplyError {
    fn from(err: LayoutError) -> Self {
        Self::Zone(ZoneError::Layout(err))
    }
}

impl From<TransitionError> for ApplyError {
    fn from(err: TransitionError) -> Self {
        Self::Transition(err)
    }
}

/// Render actor - owns the buffer, the effects and every piece of render state
///
/// Generic over the effect type `E`, the LED driver `O` and the time source
/// `C`. `LEDS` bounds the buffer, `N` the registry and `Q` the command queue.
pub struct RenderActor<
    'a,
    E: Effect,
    O: OutputDriver,
    C: Clock,
    const LEDS: usize,
    const N: usize,
    const Q: usize,
> {
    // External dependencies and configuration
    receiver: CommandReceiver<'a, Q>,
    driver: O,
    clock: C,
    config: EngineConfig,
    palettes: &'a [Palette],

    // Render state
    registry: EffectRegistry<E, N>,
    composer: ZoneComposer<E, LEDS>,
    transitions: TransitionEngine<LEDS>,
    narrative: NarrativeEngine,
    buffer: [Rgb; LEDS],
    params: AnimationParams,
    palette: u8,
    current: Option<u8>,

    // Timing
    timing: FrameTiming,
    last_tick: Option<Instant>,
    stats: RenderStats,
}

impl<'a, E, O, C, const LEDS: usize, const N: usize, const Q: usize>
    RenderActor<'a, E, O, C, LEDS, N, Q>
where
    E: Effect,
    O: OutputDriver,
    C: Clock,
{
    /// Create the actor and publish its catalog and first status snapshot
    ///
    /// `palettes` is the palette table commands index into; an empty table
    /// falls back to the rainbow palette.
    pub fn new(
        bus: &'a EngineBus<Q>,
        registry: EffectRegistry<E, N>,
        palettes: &'a [Palette],
        driver: O,
        clock: C,
        config: EngineConfig,
    ) -> Self {
        let params = AnimationParams {
            brightness: config.brightness.min(config.max_brightness),
            speed: config.speed.clamp(MIN_SPEED, MAX_SPEED),
            ..AnimationParams::default()
        };
        let mut actor = Self {
            receiver: bus.receiver(),
            driver,
            clock,
            config,
            palettes,
            registry,
            composer: ZoneComposer::new(config.strip_len),
            transitions: TransitionEngine::new(),
            narrative: NarrativeEngine::new(config.narrative),
            buffer: [BLACK; LEDS],
            params,
            palette: if usize::from(config.palette) < palettes.len() {
                config.palette
            } else {
                0
            },
            current: None,
            timing: FrameTiming {
                delta_ms: duration_ms(config.frame_duration),
                frame_number: 0,
                total_ms: 0,
            },
            last_tick: None,
            stats: RenderStats::new(),
        };
        actor.publish_catalog();
        if let Some(id) = config.initial_effect {
            if let Err(err) = actor.set_effect(id) {
                engine_log!("[RenderActor.new] initial effect {} rejected: {}", id, err);
            }
        }
        actor.publish_status();
        actor
    }

    /// Render one frame
    ///
    /// Drains up to `max_commands_per_tick` commands in FIFO order, renders,
    /// writes the buffer to the driver and publishes a [`FrameRendered`].
    pub fn tick(&mut self) -> FrameRendered {
        let started = self.clock.now();
        let delta_ms = match self.last_tick {
            Some(last) => started
                .checked_duration_since(last)
                .map_or(0, duration_ms),
            None => duration_ms(self.config.frame_duration),
        };
        self.last_tick = Some(started);
        self.timing.delta_ms = delta_ms;
        self.timing.total_ms += u64::from(delta_ms);

        self.process_commands(started);
        self.narrative.update(started);
        self.render_frame(started);

        let len = self.led_count();
        self.driver.write(&self.buffer[..len]);

        let elapsed = self
            .clock
            .now()
            .checked_duration_since(started)
            .unwrap_or(Duration::from_ticks(0));
        self.stats.record(elapsed, self.config.frame_duration);

        let frame = FrameRendered {
            frame_number: self.timing.frame_number,
            fps: self.stats.current_fps,
            cpu_percent: self.stats.cpu_percent,
            frames_rendered: self.stats.frames_rendered,
            frame_time_us: u32::try_from(elapsed.as_micros()).unwrap_or(u32::MAX),
            effect: self.current,
        };
        self.timing.frame_number = self.timing.frame_number.wrapping_add(1);
        self.params.hue = self.params.hue.wrapping_add(self.config.hue_step);

        self.publish_status();
        self.receiver.bus().publish_frame(frame);
        frame
    }

    /// Apply a command immediately, bypassing the queue
    ///
    /// Meant for the task that owns the actor; other tasks go through the bus.
    pub fn apply(&mut self, command: Command) -> Result<(), ApplyError> {
        let now = self.clock.now();
        let result = self.apply_at(command, now);
        self.publish_status();
        result
    }

    /// Register an effect and republish the catalog
    pub fn register_effect(
        &mut self,
        id: u8,
        name: &'static str,
        factory: fn() -> E,
    ) -> Result<(), RegistryError> {
        self.registry.register(id, name, factory)?;
        self.publish_catalog();
        Ok(())
    }

    /// Replace the zone layout with custom segments
    pub fn set_layout(&mut self, segments: &[ZoneSegment]) -> Result<(), LayoutError> {
        self.composer.set_layout(segments, self.registry.memory_mut())?;
        self.publish_status();
        Ok(())
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    pub fn bus(&self) -> &'a EngineBus<Q> {
        self.receiver.bus()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn current_effect(&self) -> Option<u8> {
        self.current
    }

    pub fn params(&self) -> &AnimationParams {
        &self.params
    }

    pub fn palette_index(&self) -> u8 {
        self.palette
    }

    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    /// The last rendered frame
    pub fn frame(&self) -> &[Rgb] {
        &self.buffer[..self.led_count()]
    }

    pub fn registry(&self) -> &EffectRegistry<E, N> {
        &self.registry
    }

    pub fn composer(&self) -> &ZoneComposer<E, LEDS> {
        &self.composer
    }

    pub fn transitions(&self) -> &TransitionEngine<LEDS> {
        &self.transitions
    }

    pub fn narrative(&self) -> &NarrativeEngine {
        &self.narrative
    }

    pub fn narrative_mut(&mut self) -> &mut NarrativeEngine {
        &mut self.narrative
    }

    pub fn driver(&self) -> &O {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut O {
        &mut self.driver
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    fn led_count(&self) -> usize {
        self.config.led_count().min(LEDS)
    }

    fn process_commands(&mut self, now: Instant) {
        for _ in 0..self.config.max_commands_per_tick {
            let Some(command) = self.receiver.try_receive() else {
                break;
            };
            if let Err(err) = self.apply_at(command, now) {
                self.stats.commands_rejected = self.stats.commands_rejected.saturating_add(1);
                engine_log!("[RenderActor.apply] rejected: {}", err);
            }
        }
    }

    fn apply_at(&mut self, command: Command, now: Instant) -> Result<(), ApplyError> {
        match command {
            Command::SetEffect(id) => self.set_effect(id)?,
            Command::SetBrightness(value) => {
                self.params.brightness = value.min(self.config.max_brightness);
            }
            Command::SetSpeed(value) => {
                if !(MIN_SPEED..=MAX_SPEED).contains(&value) {
                    return Err(ApplyError::InvalidValue);
                }
                self.params.speed = value;
            }
            Command::SetPalette(id) => {
                if usize::from(id) >= self.palettes.len() {
                    return Err(ApplyError::InvalidValue);
                }
                self.palette = id;
            }
            Command::SetParameter {
                effect_id,
                name,
                value,
            } => {
                let effect = self
                    .registry
                    .instance_mut(effect_id)
                    .ok_or(ApplyError::UnknownEffect(effect_id))?;
                effect.set_parameter(&name, value)?;
                self.composer.set_effect_parameter(effect_id, &name, value);
            }
            Command::SetHue(value) => self.params.hue = value,
            Command::SetIntensity(value) => self.params.intensity = value,
            Command::SetSaturation(value) => self.params.saturation = value,
            Command::SetComplexity(value) => self.params.complexity = value,
            Command::SetVariation(value) => self.params.variation = value,
            Command::SetMood(value) => self.params.mood = value,
            Command::SetFadeAmount(value) => self.params.fade_amount = value,
            Command::StartTransition {
                effect,
                kind,
                duration_ms,
            } => {
                let duration =
                    (duration_ms > 0).then(|| Duration::from_millis(u64::from(duration_ms)));
                self.start_transition(effect, kind, duration, now)?;
            }
            Command::SetZonesEnabled(enabled) => self.composer.set_enabled(enabled),
            Command::SetZoneLayout(preset) => self
                .composer
                .set_layout_preset(preset, self.registry.memory_mut())?,
            Command::LoadZonePreset(index) => self.composer.load_preset(index, &mut self.registry)?,
            Command::SetZoneEffect { zone, effect } => {
                self.composer.set_zone_effect(zone, effect, &self.registry)?;
            }
            Command::SetZoneBrightness { zone, value } => {
                self.composer.set_zone_brightness(zone, value)?;
            }
            Command::SetZoneSpeed { zone, value } => self.composer.set_zone_speed(zone, value)?,
            Command::SetZonePalette { zone, palette } => {
                if usize::from(palette) > self.palettes.len() {
                    return Err(ApplyError::InvalidValue);
                }
                self.composer.set_zone_palette(zone, palette)?;
            }
            Command::SetZoneBlendMode { zone, mode } => {
                self.composer.set_zone_blend_mode(zone, mode)?;
            }
            Command::SetZoneEnabled { zone, enabled } => {
                self.composer.set_zone_enabled(zone, enabled)?;
            }
            Command::Narrative(command) => self.narrative.apply(command, now),
        }
        Ok(())
    }

    /// Switch the single-effect path to `id`, cancelling any transition
    ///
    /// On init failure the previous effect stays active.
    fn set_effect(&mut self, id: u8) -> Result<(), ApplyError> {
        if !self.registry.is_available(id) {
            return Err(ApplyError::UnknownEffect(id));
        }
        self.init_effect(id)?;

        if let Some(cancelled) = self.transitions.cancel() {
            if cancelled.to != id {
                self.retire(cancelled.to);
            }
        }
        if let Some(previous) = self.current.replace(id).filter(|previous| *previous != id) {
            self.retire(previous);
        }
        Ok(())
    }

    /// Blend from the current effect into `to`
    ///
    /// A transition already running is superseded; its target is released
    /// unless it is still in use.
    fn start_transition(
        &mut self,
        to: u8,
        kind: TransitionKind,
        duration: Option<Duration>,
        now: Instant,
    ) -> Result<(), ApplyError> {
        if !self.registry.is_available(to) {
            return Err(TransitionError::UnknownEffect(to).into());
        }
        if self.current == Some(to) {
            return Err(TransitionError::SameEffect.into());
        }
        self.init_effect(to)?;

        let superseded = self.transitions.cancel();
        self.transitions
            .trigger(self.current, to, kind, duration, now, &self.registry)?;
        if let Some(old) = superseded {
            if old.to != to && Some(old.to) != self.current {
                self.retire(old.to);
            }
        }
        Ok(())
    }

    /// Initialize the shared instance of `id`
    ///
    /// A failing effect is marked unavailable and dropped from the catalog,
    /// unless the failure was a full working set pool.
    fn init_effect(&mut self, id: u8) -> Result<(), ApplyError> {
        let input = self.frame_input();
        let len = self.led_count();
        let (effect, memory) = self
            .registry
            .instance_with_memory(id)
            .ok_or(ApplyError::UnknownEffect(id))?;
        let mut ctx = EffectContext::new(&mut self.buffer[..len], &input, &self.narrative, memory);
        let Err(err) = effect.init(&mut ctx) else {
            return Ok(());
        };
        effect.cleanup(memory);
        engine_log!("[RenderActor.init_effect] effect {} init failed: {}", id, err);
        self.drop_failed_effect(id, err);
        Err(ApplyError::InitFailed(id, err))
    }

    /// Remove an effect whose `init` failed from the catalog
    ///
    /// Pool exhaustion clears once a block is released, so it only fails the
    /// request at hand.
    fn drop_failed_effect(&mut self, id: u8, err: InitError) {
        if err == InitError::WorkingSetExhausted || !self.registry.is_available(id) {
            return;
        }
        engine_log!("[RenderActor.drop_failed_effect] effect {} unavailable", id);
        self.registry.mark_unavailable(id);
        self.publish_catalog();
    }

    fn retire(&mut self, id: u8) {
        if let Some((effect, memory)) = self.registry.instance_with_memory(id) {
            effect.cleanup(memory);
        }
    }

    fn render_frame(&mut self, now: Instant) {
        let input = self.frame_input();
        let len = self.led_count();
        let strip_len = self.config.strip_len;

        match self.transitions.advance(now) {
            TransitionStep::Blend { from, to, raw } => {
                let (from_leds, to_leds) = self.transitions.buffers_mut(len);
                render_effect(&mut self.registry, from, from_leds, &input, &self.narrative);
                render_effect(&mut self.registry, Some(to), to_leds, &input, &self.narrative);
                self.transitions.compose(&mut self.buffer[..len], raw, strip_len);
                return;
            }
            TransitionStep::Finished { to } => self.current = Some(to),
            TransitionStep::Idle => {}
        }

        if self.composer.is_enabled() {
            let started = self.clock.now();
            let report = self.composer.render(
                &mut self.buffer[..len],
                &input,
                self.palettes,
                &self.narrative,
                self.registry.memory_mut(),
            );
            if let Some(elapsed) = self.clock.now().checked_duration_since(started) {
                self.composer.timing_mut().record(elapsed);
            }
            for (id, err) in report.init_failures {
                self.drop_failed_effect(id, err);
            }
        } else {
            render_effect(
                &mut self.registry,
                self.current,
                &mut self.buffer[..len],
                &input,
                &self.narrative,
            );
        }
    }

    fn frame_input(&self) -> FrameInput<'a> {
        FrameInput {
            palette: self.active_palette(),
            params: self.params,
            timing: self.timing,
            strip_len: self.config.strip_len,
            seed: hash32(self.timing.frame_number ^ 0x9e37_79b9),
            zone: None,
        }
    }

    fn active_palette(&self) -> &'a Palette {
        self.palettes
            .get(usize::from(self.palette))
            .unwrap_or(&RAINBOW)
    }

    fn publish_catalog(&self) {
        let palette_count = u8::try_from(self.palettes.len()).unwrap_or(u8::MAX);
        self.receiver
            .bus()
            .publish_catalog(self.registry.catalog(palette_count));
    }

    fn publish_status(&self) {
        self.receiver.bus().publish_status(EngineStatus {
            current_effect: self.current,
            brightness: self.params.brightness,
            speed: self.params.speed,
            palette: self.palette,
            hue: self.params.hue,
            transition_active: self.transitions.is_active(),
            zones_enabled: self.composer.is_enabled(),
            zone_count: u8::try_from(self.composer.zone_count()).unwrap_or(u8::MAX),
            zones: *self.composer.zones(),
            stats: self.stats,
        });
    }
}

/// Render the shared instance of `id` into `leds`, or black without one
fn render_effect<E: Effect, const N: usize>(
    registry: &mut EffectRegistry<E, N>,
    id: Option<u8>,
    leds: &mut [Rgb],
    input: &FrameInput<'_>,
    narrative: &NarrativeEngine,
) {
    match id.and_then(|id| registry.instance_with_memory(id)) {
        Some((effect, memory)) => {
            let mut ctx = EffectContext::new(leds, input, narrative, memory);
            effect.render(&mut ctx);
        }
        None => leds.fill(BLACK),
    }
}

fn duration_ms(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}
