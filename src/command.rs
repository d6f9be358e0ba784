//! Commands accepted by the render actor.
//!
//! Commands are produced by other tasks (network, audio, UI) and consumed
//! exactly once by the [`RenderActor`](crate::RenderActor) in FIFO order.

use core::fmt;

use heapless::String;

use crate::narrative::{EasingCurve, NarrativePhase};
use crate::transition::TransitionKind;
use crate::zone::{BlendMode, LayoutPreset};

/// Maximum length of an effect parameter name
pub const PARAM_NAME_LEN: usize = 24;

/// Effect parameter name carried by [`Command::SetParameter`]
pub type ParamName = String<PARAM_NAME_LEN>;

/// Commands that can be sent to the render engine
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Switch the active effect immediately
    SetEffect(u8),
    /// Set master brightness (clamped to the configured maximum)
    SetBrightness(u8),
    /// Set animation speed, 1-100
    SetSpeed(u8),
    /// Select the global palette
    SetPalette(u8),
    /// Set a named tunable on a registered effect
    SetParameter {
        effect_id: u8,
        name: ParamName,
        value: f32,
    },
    /// Set the base hue
    SetHue(u8),
    SetIntensity(u8),
    SetSaturation(u8),
    SetComplexity(u8),
    SetVariation(u8),
    SetMood(u8),
    SetFadeAmount(u8),
    /// Blend from the active effect into `effect`
    StartTransition {
        effect: u8,
        kind: TransitionKind,
        /// Zero selects the default duration of `kind`
        duration_ms: u16,
    },
    /// Enable or disable zone compositing
    SetZonesEnabled(bool),
    SetZoneLayout(LayoutPreset),
    LoadZonePreset(u8),
    SetZoneEffect { zone: u8, effect: u8 },
    SetZoneBrightness { zone: u8, value: u8 },
    SetZoneSpeed { zone: u8, value: u8 },
    SetZonePalette { zone: u8, palette: u8 },
    SetZoneBlendMode { zone: u8, mode: BlendMode },
    SetZoneEnabled { zone: u8, enabled: bool },
    /// Narrative conductor control
    Narrative(NarrativeCommand),
}

impl Command {
    /// Build a [`Command::SetParameter`]
    ///
    /// Returns `None` when `name` is longer than [`PARAM_NAME_LEN`].
    pub fn set_parameter(effect_id: u8, name: &str, value: f32) -> Option<Self> {
        let mut owned = ParamName::new();
        owned.push_str(name).ok()?;
        Some(Self::SetParameter {
            effect_id,
            name: owned,
            value,
        })
    }
}

/// Narrative conductor commands
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NarrativeCommand {
    Enable,
    Disable,
    Pause,
    Resume,
    Trigger,
    Reset,
    /// Durations of build, hold, release and rest in seconds
    SetDurations {
        build: f32,
        hold: f32,
        release: f32,
        rest: f32,
    },
    /// Scale all phase durations so one cycle lasts `seconds`
    SetTempo(f32),
    SetCurves {
        build: EasingCurve,
        release: EasingCurve,
    },
    SetHoldBreathe(f32),
    SetSnap(f32),
    SetVariance(f32),
    SetZoneOffset { zone: u8, offset: f32 },
    /// Negative disables the override
    SetTension(f32),
    /// Jump to `phase`, which then lasts `duration_ms`
    SetPhase {
        phase: NarrativePhase,
        duration_ms: u32,
    },
}

/// Reasons an [`enqueue`](crate::bus::CommandSender::enqueue) call is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueError {
    /// The queue is at capacity; the command was dropped
    QueueFull,
    /// The command names an effect id that is not registered
    InvalidEffect(u8),
    /// A value is outside its accepted range
    InvalidValue,
}

impl fmt::Display for EnqueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => f.write_str("command queue is full"),
            Self::InvalidEffect(id) => write!(f, "effect {id} is not registered"),
            Self::InvalidValue => f.write_str("command value out of range"),
        }
    }
}
