//! Timed hand-off between two effects
//!
//! The engine is a small state machine: `Idle -> Running -> Complete -> Idle`.
//! While running, the render actor renders the outgoing and incoming effects
//! into the engine's two private buffers and [`TransitionEngine::compose`]
//! mixes them per LED.

mod kind;

use core::fmt;

use embassy_time::{Duration, Instant};

pub use kind::{LedPosition, TransitionKind};

use crate::color::{BLACK, Rgb, blend_colors};
use crate::easing::EasingCurve;
use crate::effect::Effect;
use crate::geometry::{center_pair_distance, max_center_distance, strip_local};
use crate::math8::{clamp01, unit_to_u8};
use crate::random::hash32;
use crate::registry::EffectRegistry;

/// Why a transition could not start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// Target is not registered or not available
    UnknownEffect(u8),
    /// Target is already the active effect
    SameEffect,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownEffect(id) => write!(f, "effect {id} is not available"),
            Self::SameEffect => f.write_str("effect is already active"),
        }
    }
}

/// A transition in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveTransition {
    /// Outgoing effect; `None` fades in from black
    pub from: Option<u8>,
    pub to: u8,
    pub kind: TransitionKind,
    pub curve: EasingCurve,
    pub started: Instant,
    pub duration: Duration,
    /// Seed for per-LED randomness, fixed for the whole transition
    pub seed: u32,
}

impl ActiveTransition {
    /// Linear time progress in 0..=1
    #[allow(clippy::cast_precision_loss)]
    pub fn raw_progress(&self, now: Instant) -> f32 {
        let total = self.duration.as_micros();
        if total == 0 {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started).as_micros();
        clamp01(elapsed as f32 / total as f32)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionState {
    #[default]
    Idle,
    Running(ActiveTransition),
    /// Finished this frame; becomes `Idle` on the next advance
    Complete { to: u8 },
}

/// What the render actor should do this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionStep {
    /// No transition; render normally
    Idle,
    /// Render both effects and compose them at `progress`
    Blend {
        from: Option<u8>,
        to: u8,
        raw: f32,
    },
    /// The transition just finished; `to` is now the active effect
    Finished { to: u8 },
}

/// Blends the outgoing and incoming effect frames over time
pub struct TransitionEngine<const LEDS: usize> {
    state: TransitionState,
    from: [Rgb; LEDS],
    to: [Rgb; LEDS],
    triggers: u32,
}

impl<const LEDS: usize> Default for TransitionEngine<LEDS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const LEDS: usize> TransitionEngine<LEDS> {
    pub const fn new() -> Self {
        Self {
            state: TransitionState::Idle,
            from: [BLACK; LEDS],
            to: [BLACK; LEDS],
            triggers: 0,
        }
    }

    pub fn state(&self) -> &TransitionState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, TransitionState::Running(_))
    }

    pub fn active(&self) -> Option<&ActiveTransition> {
        match &self.state {
            TransitionState::Running(active) => Some(active),
            _ => None,
        }
    }

    /// Eased progress of the running transition, 0 when idle
    pub fn progress(&self, now: Instant) -> f32 {
        self.active().map_or(0.0, |active| {
            active.curve.apply(active.raw_progress(now))
        })
    }

    /// Start a transition to `to`, replacing any transition in flight
    ///
    /// `duration` of `None` uses the kind's default. Rejected triggers
    /// leave the state untouched.
    pub fn trigger<E: Effect, const N: usize>(
        &mut self,
        from: Option<u8>,
        to: u8,
        kind: TransitionKind,
        duration: Option<Duration>,
        now: Instant,
        registry: &EffectRegistry<E, N>,
    ) -> Result<(), TransitionError> {
        if !registry.is_available(to) {
            return Err(TransitionError::UnknownEffect(to));
        }
        if from == Some(to) {
            return Err(TransitionError::SameEffect);
        }
        self.triggers = self.triggers.wrapping_add(1);
        let duration = duration.unwrap_or(kind.default_duration());
        self.state = TransitionState::Running(ActiveTransition {
            from,
            to,
            kind,
            curve: kind.default_curve(),
            started: now,
            duration,
            seed: hash32(self.triggers ^ (u32::from(to) << 8)),
        });
        self.from.fill(BLACK);
        self.to.fill(BLACK);
        engine_log!(
            "[TransitionEngine.trigger] {} to {} over {}ms",
            kind.as_str(),
            to,
            duration.as_millis()
        );
        Ok(())
    }

    /// Abort the running transition, returning it
    pub fn cancel(&mut self) -> Option<ActiveTransition> {
        let active = self.active().copied();
        self.state = TransitionState::Idle;
        active
    }

    /// Move the state machine forward to `now`
    pub fn advance(&mut self, now: Instant) -> TransitionStep {
        match self.state {
            TransitionState::Idle => TransitionStep::Idle,
            TransitionState::Complete { .. } => {
                self.state = TransitionState::Idle;
                TransitionStep::Idle
            }
            TransitionState::Running(active) => {
                let raw = active.raw_progress(now);
                if raw >= 1.0 {
                    self.state = TransitionState::Complete { to: active.to };
                    engine_log!("[TransitionEngine.advance] complete, now {}", active.to);
                    TransitionStep::Finished { to: active.to }
                } else {
                    TransitionStep::Blend {
                        from: active.from,
                        to: active.to,
                        raw,
                    }
                }
            }
        }
    }

    /// Private buffers for the outgoing and incoming frames
    pub fn buffers_mut(&mut self, len: usize) -> (&mut [Rgb], &mut [Rgb]) {
        let len = len.min(LEDS);
        (&mut self.from[..len], &mut self.to[..len])
    }

    /// Mix the two private buffers into `output` at linear progress `raw`
    pub fn compose(&self, output: &mut [Rgb], raw: f32, strip_len: usize) {
        let Some(active) = self.active() else {
            return;
        };
        let progress = active.curve.apply(raw);
        compose_frames(
            active.kind,
            progress,
            raw,
            active.seed,
            &self.from,
            &self.to,
            output,
            strip_len,
        );
    }
}

/// Mix `from` and `to` into `output` with `kind` at eased `progress`
#[allow(clippy::too_many_arguments, clippy::cast_precision_loss)]
pub fn compose_frames(
    kind: TransitionKind,
    progress: f32,
    raw: f32,
    seed: u32,
    from: &[Rgb],
    to: &[Rgb],
    output: &mut [Rgb],
    strip_len: usize,
) {
    let strip_len = if strip_len == 0 {
        output.len()
    } else {
        strip_len
    };
    let reach = max_center_distance(strip_len).max(1) as f32;
    let leds = output.iter_mut().zip(from.iter().zip(to.iter()));
    for (index, (out, (a, b))) in leds.enumerate() {
        let distance = center_pair_distance(index, strip_len) as f32;
        let led = LedPosition {
            index,
            local: strip_local(index, strip_len),
            strip_len,
            distance,
            normalized: clamp01(distance / reach),
            reach,
        };
        let factor = kind.mix(progress, raw, &led, seed);
        let mixed = blend_colors(*a, *b, unit_to_u8(factor));
        *out = kind.overlay(progress, &led, mixed);
    }
}
