//! Dramatic timing conductor
//!
//! A single cyclic state machine (build, hold, release, rest) that effects
//! can query to shape their own intensity. The engine is advanced once per
//! frame with [`NarrativeEngine::update`]; every query reads the time of the
//! last update, so all effects in one frame see the same values.
//!
//! When disabled, queries return neutral values so effects can query it
//! unconditionally.

use core::f32::consts::TAU;

use embassy_time::{Duration, Instant};

pub use crate::easing::EasingCurve;
use crate::command::NarrativeCommand;
use crate::math8::clamp01;
use crate::random::FastRng;
use crate::zone::MAX_ZONES;

const MIN_SWEEP_SECONDS: f32 = 0.01;
const MIN_PHASE_MS: u32 = 100;
const MAX_PHASE_MS: u32 = 60_000;
const VARIANCE_SEED: u32 = 0x6e61_7272;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NarrativePhase {
    #[default]
    Build,
    Hold,
    Release,
    Rest,
}

impl NarrativePhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Hold => "hold",
            Self::Release => "release",
            Self::Rest => "rest",
        }
    }
}

/// Shape of one narrative cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NarrativeConfig {
    /// Phase durations in seconds
    pub build: f32,
    pub hold: f32,
    pub release: f32,
    pub rest: f32,
    pub build_curve: EasingCurve,
    pub release_curve: EasingCurve,
    /// Depth of the intensity dip while holding, 0..1
    pub hold_breathe: f32,
    /// How sharply build and release snap around their midpoint, 0..1
    pub snap: f32,
    /// Random per-cycle duration spread, 0..1
    pub variance: f32,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            build: 1.5,
            hold: 0.5,
            release: 1.5,
            rest: 0.5,
            build_curve: EasingCurve::InQuad,
            release_curve: EasingCurve::OutQuad,
            hold_breathe: 0.1,
            snap: 0.0,
            variance: 0.0,
        }
    }
}

impl NarrativeConfig {
    pub fn total(&self) -> f32 {
        self.build + self.hold + self.release + self.rest
    }

    /// Cycle fractions where build, hold and release end
    fn boundaries(&self) -> [f32; 3] {
        let total = self.total();
        [
            self.build / total,
            (self.build + self.hold) / total,
            (self.build + self.hold + self.release) / total,
        ]
    }

    fn phase_at(&self, cycle_t: f32) -> NarrativePhase {
        if self.total() <= 0.0 {
            return NarrativePhase::Build;
        }
        let [build_end, hold_end, release_end] = self.boundaries();
        if cycle_t < build_end {
            NarrativePhase::Build
        } else if cycle_t < hold_end {
            NarrativePhase::Hold
        } else if cycle_t < release_end {
            NarrativePhase::Release
        } else {
            NarrativePhase::Rest
        }
    }

    fn phase_t_at(&self, cycle_t: f32) -> f32 {
        if self.total() <= 0.0 {
            return 0.0;
        }
        let [build_end, hold_end, release_end] = self.boundaries();
        let (start, end) = match self.phase_at(cycle_t) {
            NarrativePhase::Build => (0.0, build_end),
            NarrativePhase::Hold => (build_end, hold_end),
            NarrativePhase::Release => (hold_end, release_end),
            NarrativePhase::Rest => (release_end, 1.0),
        };
        let span = end - start;
        if span <= 0.0 {
            return 0.0;
        }
        clamp01((cycle_t - start) / span)
    }

    fn intensity_at(&self, cycle_t: f32) -> f32 {
        let phase = self.phase_at(cycle_t);
        let t = self.phase_t_at(cycle_t);
        let intensity = match phase {
            NarrativePhase::Build => self.build_curve.apply(t),
            NarrativePhase::Hold => self.breathe(t),
            NarrativePhase::Release => 1.0 - self.release_curve.apply(t),
            NarrativePhase::Rest => 0.0,
        };
        let intensity = match phase {
            NarrativePhase::Build | NarrativePhase::Release if self.snap > 0.0 => {
                self.apply_snap(intensity)
            }
            _ => intensity,
        };
        clamp01(intensity)
    }

    fn breathe(&self, t: f32) -> f32 {
        1.0 - self.hold_breathe * 0.5 * (1.0 - libm::cosf(t * TAU))
    }

    fn apply_snap(&self, x: f32) -> f32 {
        let exponent = 1.0 + self.snap * 4.0;
        if x < 0.5 {
            0.5 * libm::powf(2.0 * x, exponent)
        } else {
            1.0 - 0.5 * libm::powf(2.0 * (1.0 - x), exponent)
        }
    }

    /// Seconds from cycle start to the start of `phase`
    fn phase_offset(&self, phase: NarrativePhase) -> f32 {
        match phase {
            NarrativePhase::Build => 0.0,
            NarrativePhase::Hold => self.build,
            NarrativePhase::Release => self.build + self.hold,
            NarrativePhase::Rest => self.build + self.hold + self.release,
        }
    }
}

/// The narrative conductor
#[derive(Debug, Clone)]
pub struct NarrativeEngine {
    config: NarrativeConfig,
    enabled: bool,
    paused_at: Option<Instant>,
    now: Instant,
    cycle_start: Instant,
    /// Duration multiplier picked at the start of every cycle
    cycle_scale: f32,
    phase: NarrativePhase,
    just_changed: bool,
    /// Phase entry from a command, reported by the next `update`
    entered_by_command: bool,
    tension_override: Option<f32>,
    zone_offsets: [f32; MAX_ZONES],
    rng: FastRng,
}

impl Default for NarrativeEngine {
    fn default() -> Self {
        Self::new(NarrativeConfig::default())
    }
}

impl NarrativeEngine {
    pub fn new(config: NarrativeConfig) -> Self {
        Self {
            config,
            enabled: false,
            paused_at: None,
            now: Instant::MIN,
            cycle_start: Instant::MIN,
            cycle_scale: 1.0,
            phase: NarrativePhase::Build,
            just_changed: false,
            entered_by_command: false,
            tension_override: None,
            zone_offsets: [0.0; MAX_ZONES],
            rng: FastRng::new(VARIANCE_SEED),
        }
    }

    pub fn config(&self) -> &NarrativeConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Start the conductor from the beginning of a cycle
    pub fn enable(&mut self) {
        if !self.enabled {
            self.enabled = true;
            self.restart_cycle();
            self.just_changed = false;
            self.entered_by_command = false;
            engine_log!("[NarrativeEngine.enable] enabled");
        }
    }

    pub fn disable(&mut self) {
        if self.enabled {
            engine_log!("[NarrativeEngine.disable] disabled");
        }
        self.enabled = false;
        self.paused_at = None;
        self.just_changed = false;
        self.entered_by_command = false;
    }

    /// Advance to `now`; call once per frame
    pub fn update(&mut self, now: Instant) {
        self.now = now;
        self.just_changed = core::mem::take(&mut self.entered_by_command);
        if !self.enabled || self.paused_at.is_some() {
            return;
        }

        let cycle = self.cycle_duration();
        if cycle > Duration::from_ticks(0) {
            let elapsed = now.saturating_duration_since(self.cycle_start);
            if elapsed >= cycle * 2 {
                // Stalled for more than a cycle, start over
                self.cycle_start = now;
                self.pick_cycle_scale();
            } else if elapsed >= cycle {
                self.cycle_start += cycle;
                self.pick_cycle_scale();
            }
        }

        let phase = self.config.phase_at(self.base_cycle_t());
        if phase != self.phase {
            self.phase = phase;
            self.just_changed = true;
        }
    }

    /// Force a restart at the beginning of build
    pub fn trigger(&mut self) {
        self.restart_cycle();
        self.mark_entered();
    }

    /// Reset timing, pause state and the cycle
    pub fn reset(&mut self) {
        self.paused_at = None;
        self.restart_cycle();
        self.mark_entered();
    }

    fn mark_entered(&mut self) {
        self.just_changed = true;
        self.entered_by_command = true;
    }

    pub fn pause(&mut self) {
        if self.enabled && self.paused_at.is_none() {
            self.paused_at = Some(self.now);
        }
    }

    /// Resume; time spent paused does not count towards the cycle
    pub fn resume(&mut self) {
        if let Some(paused_at) = self.paused_at.take() {
            self.cycle_start += self.now.saturating_duration_since(paused_at);
        }
    }

    /// Set all four phase durations in seconds
    ///
    /// Build and release are at least 10 ms, hold and rest at least zero.
    pub fn set_durations(&mut self, build: f32, hold: f32, release: f32, rest: f32) {
        self.config.build = sanitize(build, MIN_SWEEP_SECONDS);
        self.config.hold = sanitize(hold, 0.0);
        self.config.release = sanitize(release, MIN_SWEEP_SECONDS);
        self.config.rest = sanitize(rest, 0.0);
    }

    /// Scale every phase so one cycle lasts `total` seconds
    pub fn set_tempo(&mut self, total: f32) {
        let current = self.config.total();
        if current <= 0.0 || total <= 0.0 || !total.is_finite() {
            return;
        }
        let scale = total / current;
        self.config.build *= scale;
        self.config.hold *= scale;
        self.config.release *= scale;
        self.config.rest *= scale;
    }

    pub fn set_curves(&mut self, build: EasingCurve, release: EasingCurve) {
        self.config.build_curve = build;
        self.config.release_curve = release;
    }

    pub fn set_hold_breathe(&mut self, amount: f32) {
        self.config.hold_breathe = clamp01(amount);
    }

    pub fn set_snap(&mut self, amount: f32) {
        self.config.snap = clamp01(amount);
    }

    pub fn set_variance(&mut self, amount: f32) {
        self.config.variance = clamp01(amount);
    }

    /// Offset a zone by a fraction of the cycle, wrapped into 0..1
    pub fn set_zone_offset(&mut self, zone: u8, offset: f32) {
        if let Some(slot) = self.zone_offsets.get_mut(usize::from(zone)) {
            if offset.is_finite() {
                let wrapped = libm::fmodf(offset, 1.0);
                *slot = if wrapped < 0.0 { wrapped + 1.0 } else { wrapped };
            }
        }
    }

    pub fn zone_offset(&self, zone: u8) -> f32 {
        self.zone_offsets
            .get(usize::from(zone))
            .copied()
            .unwrap_or(0.0)
    }

    /// Pin the intensity to `tension`; a negative value releases it
    pub fn set_tension(&mut self, tension: f32) {
        self.tension_override = if tension < 0.0 || tension.is_nan() {
            None
        } else {
            Some(clamp01(tension))
        };
    }

    /// Jump to the start of `phase`, which then lasts `duration_ms` (100-60000)
    #[allow(clippy::cast_precision_loss)]
    pub fn set_phase(&mut self, phase: NarrativePhase, duration_ms: u32) {
        let seconds = duration_ms.clamp(MIN_PHASE_MS, MAX_PHASE_MS) as f32 / 1000.0;
        match phase {
            NarrativePhase::Build => self.config.build = seconds,
            NarrativePhase::Hold => self.config.hold = seconds,
            NarrativePhase::Release => self.config.release = seconds,
            NarrativePhase::Rest => self.config.rest = seconds,
        }
        self.cycle_scale = 1.0;
        let offset = seconds_to_duration(self.config.phase_offset(phase));
        self.cycle_start = self.now.checked_sub(offset).unwrap_or(Instant::MIN);
        self.paused_at = self.paused_at.map(|_| self.now);
        if phase != self.phase {
            self.mark_entered();
        }
        self.phase = phase;
    }

    /// Apply a control command received at `now`
    pub fn apply(&mut self, command: NarrativeCommand, now: Instant) {
        self.now = now;
        match command {
            NarrativeCommand::Enable => self.enable(),
            NarrativeCommand::Disable => self.disable(),
            NarrativeCommand::Pause => self.pause(),
            NarrativeCommand::Resume => self.resume(),
            NarrativeCommand::Trigger => self.trigger(),
            NarrativeCommand::Reset => self.reset(),
            NarrativeCommand::SetDurations {
                build,
                hold,
                release,
                rest,
            } => self.set_durations(build, hold, release, rest),
            NarrativeCommand::SetTempo(total) => self.set_tempo(total),
            NarrativeCommand::SetCurves { build, release } => self.set_curves(build, release),
            NarrativeCommand::SetHoldBreathe(amount) => self.set_hold_breathe(amount),
            NarrativeCommand::SetSnap(amount) => self.set_snap(amount),
            NarrativeCommand::SetVariance(amount) => self.set_variance(amount),
            NarrativeCommand::SetZoneOffset { zone, offset } => self.set_zone_offset(zone, offset),
            NarrativeCommand::SetTension(tension) => self.set_tension(tension),
            NarrativeCommand::SetPhase { phase, duration_ms } => {
                self.set_phase(phase, duration_ms);
            }
        }
    }

    /// Progress through the whole cycle, 0..1
    pub fn cycle_t(&self, zone: Option<u8>) -> f32 {
        if !self.enabled {
            return 0.0;
        }
        self.offset_cycle_t(zone)
    }

    pub fn phase(&self, zone: Option<u8>) -> NarrativePhase {
        if !self.enabled {
            return NarrativePhase::Hold;
        }
        self.config.phase_at(self.offset_cycle_t(zone))
    }

    /// Progress within the current phase, 0..1
    pub fn phase_t(&self, zone: Option<u8>) -> f32 {
        if !self.enabled {
            return 1.0;
        }
        self.config.phase_t_at(self.offset_cycle_t(zone))
    }

    /// Current dramatic intensity, 0..1
    pub fn intensity(&self, zone: Option<u8>) -> f32 {
        if let Some(tension) = self.tension_override {
            return tension;
        }
        if !self.enabled {
            return 1.0;
        }
        self.config.intensity_at(self.offset_cycle_t(zone))
    }

    /// Global intensity used for tempo and complexity scaling
    pub fn tension(&self) -> f32 {
        self.intensity(None)
    }

    /// 1.0 at rest up to 1.5 at full tension
    pub fn tempo_multiplier(&self) -> f32 {
        if !self.enabled && self.tension_override.is_none() {
            return 1.0;
        }
        1.0 + self.tension() * 0.5
    }

    /// 0.5 at rest up to 1.0 at full tension
    pub fn complexity_scaling(&self) -> f32 {
        if !self.enabled && self.tension_override.is_none() {
            return 1.0;
        }
        0.5 + self.tension() * 0.5
    }

    /// True for exactly one update after the conductor entered `phase`
    pub fn just_entered(&self, phase: NarrativePhase) -> bool {
        self.enabled && self.just_changed && self.phase == phase
    }

    fn restart_cycle(&mut self) {
        self.cycle_start = self.now;
        self.phase = NarrativePhase::Build;
        self.pick_cycle_scale();
        if self.paused_at.is_some() {
            self.paused_at = Some(self.now);
        }
    }

    fn pick_cycle_scale(&mut self) {
        self.cycle_scale = if self.config.variance > 0.0 {
            1.0 + self.config.variance * (self.rng.next_f32() - 0.5)
        } else {
            1.0
        };
    }

    fn cycle_duration(&self) -> Duration {
        seconds_to_duration(self.config.total() * self.cycle_scale)
    }

    #[allow(clippy::cast_precision_loss)]
    fn base_cycle_t(&self) -> f32 {
        let cycle = self.cycle_duration().as_micros();
        if cycle == 0 {
            return 0.0;
        }
        let now = self.paused_at.unwrap_or(self.now);
        let elapsed = now.saturating_duration_since(self.cycle_start).as_micros();
        clamp01(elapsed as f32 / cycle as f32)
    }

    fn offset_cycle_t(&self, zone: Option<u8>) -> f32 {
        let base = self.base_cycle_t();
        match zone.and_then(|zone| self.zone_offsets.get(usize::from(zone))) {
            Some(offset) => libm::fmodf(base + offset, 1.0),
            None => base,
        }
    }
}

fn sanitize(seconds: f32, min: f32) -> f32 {
    if seconds.is_finite() {
        seconds.max(min)
    } else {
        min
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn seconds_to_duration(seconds: f32) -> Duration {
    Duration::from_micros((seconds.max(0.0) * 1_000_000.0) as u64)
}
