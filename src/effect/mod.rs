//! Effect system with compile-time known effect variants
//!
//! Every effect implements [`Effect`] and owns all of its animation state,
//! so two instances of the same effect (for example in two zones) animate
//! independently. Built-in effects are stored in the [`EffectSlot`] enum to
//! avoid heap allocations; applications can supply their own enum instead.

mod breathing;
mod center_pulse;
mod confetti;
mod context;
mod fire;
mod heartbeat;
mod memory;
mod ocean;
mod params;
mod rainbow;
mod solid;

use core::fmt;

pub use breathing::BreathingEffect;
pub use center_pulse::CenterPulseEffect;
pub use confetti::ConfettiEffect;
pub use context::{AnimationParams, EffectContext, FrameInput, FrameTiming};
pub use fire::FireEffect;
pub use heartbeat::HeartbeatEffect;
pub use memory::{
    ArenaError, BlockHandle, WORKING_SET_BLOCK_LEN, WORKING_SET_BLOCKS, WorkingSetPool,
};
pub use ocean::OceanEffect;
pub use params::{ParameterDescriptor, ParameterError};
pub use rainbow::RainbowEffect;
pub use solid::SolidEffect;

use crate::registry::{EffectRegistry, RegistryError};

const EFFECT_NAME_SOLID: &str = "solid";
const EFFECT_NAME_RAINBOW: &str = "rainbow";
const EFFECT_NAME_FIRE: &str = "fire";
const EFFECT_NAME_OCEAN: &str = "ocean";
const EFFECT_NAME_CONFETTI: &str = "confetti";
const EFFECT_NAME_CENTER_PULSE: &str = "center_pulse";
const EFFECT_NAME_BREATHING: &str = "breathing";
const EFFECT_NAME_HEARTBEAT: &str = "heartbeat";

const EFFECT_ID_SOLID: u8 = 0;
const EFFECT_ID_RAINBOW: u8 = 1;
const EFFECT_ID_FIRE: u8 = 2;
const EFFECT_ID_OCEAN: u8 = 3;
const EFFECT_ID_CONFETTI: u8 = 4;
const EFFECT_ID_CENTER_PULSE: u8 = 5;
const EFFECT_ID_BREATHING: u8 = 6;
const EFFECT_ID_HEARTBEAT: u8 = 7;

/// Broad grouping used by UIs to organize effects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectCategory {
    Ambient,
    Fire,
    Water,
    Geometric,
    Particle,
    Rhythmic,
    Utility,
}

/// Static description of an effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectMetadata {
    pub name: &'static str,
    pub description: &'static str,
    pub category: EffectCategory,
    pub version: u8,
}

/// Why an effect could not be activated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// No working-set block was free
    WorkingSetExhausted,
    /// The strip geometry is not supported by this effect
    Unsupported,
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WorkingSetExhausted => f.write_str("working set pool exhausted"),
            Self::Unsupported => f.write_str("strip geometry not supported"),
        }
    }
}

impl From<ArenaError> for InitError {
    fn from(_: ArenaError) -> Self {
        Self::WorkingSetExhausted
    }
}

/// The contract every visual effect implements
pub trait Effect {
    /// Reset animation state and acquire resources before the effect is
    /// shown. Must fail fast instead of waiting for resources.
    fn init(&mut self, ctx: &mut EffectContext<'_>) -> Result<(), InitError>;

    /// Render a single frame into `ctx.leds`
    fn render(&mut self, ctx: &mut EffectContext<'_>);

    /// Release instance-owned resources
    fn cleanup(&mut self, _memory: &mut WorkingSetPool) {}

    /// Describe the effect
    fn metadata(&self) -> EffectMetadata;

    /// Tunable parameters exposed by the effect
    fn parameters(&self) -> &'static [ParameterDescriptor] {
        &[]
    }

    /// Current value of a declared parameter
    fn parameter_value(&self, _name: &str) -> Option<f32> {
        None
    }

    /// Store an already validated parameter value
    fn store_parameter(&mut self, _name: &str, _value: f32) {}

    fn parameter_count(&self) -> usize {
        self.parameters().len()
    }

    fn parameter_descriptor(&self, index: usize) -> Option<&'static ParameterDescriptor> {
        self.parameters().get(index)
    }

    fn find_parameter(&self, name: &str) -> Option<&'static ParameterDescriptor> {
        self.parameters().iter().find(|param| param.name == name)
    }

    /// Value of a parameter, falling back to its declared default
    fn get_parameter(&self, name: &str) -> Option<f32> {
        let descriptor = self.find_parameter(name)?;
        Some(self.parameter_value(name).unwrap_or(descriptor.default))
    }

    /// Validate `value` against the parameter's declared range and store it
    fn set_parameter(&mut self, name: &str, value: f32) -> Result<(), ParameterError> {
        let descriptor = self.find_parameter(name).ok_or(ParameterError::Unknown)?;
        descriptor.validate(value)?;
        self.store_parameter(name, value);
        Ok(())
    }
}

/// Effect slot - enum containing all built-in effects
#[derive(Debug, Clone)]
pub enum EffectSlot {
    Solid(SolidEffect),
    Rainbow(RainbowEffect),
    Fire(FireEffect),
    Ocean(OceanEffect),
    Confetti(ConfettiEffect),
    CenterPulse(CenterPulseEffect),
    Breathing(BreathingEffect),
    Heartbeat(HeartbeatEffect),
}

macro_rules! dispatch {
    ($slot:expr, $effect:ident => $body:expr) => {
        match $slot {
            EffectSlot::Solid($effect) => $body,
            EffectSlot::Rainbow($effect) => $body,
            EffectSlot::Fire($effect) => $body,
            EffectSlot::Ocean($effect) => $body,
            EffectSlot::Confetti($effect) => $body,
            EffectSlot::CenterPulse($effect) => $body,
            EffectSlot::Breathing($effect) => $body,
            EffectSlot::Heartbeat($effect) => $body,
        }
    };
}

impl Effect for EffectSlot {
    fn init(&mut self, ctx: &mut EffectContext<'_>) -> Result<(), InitError> {
        dispatch!(self, effect => effect.init(ctx))
    }

    fn render(&mut self, ctx: &mut EffectContext<'_>) {
        dispatch!(self, effect => effect.render(ctx));
    }

    fn cleanup(&mut self, memory: &mut WorkingSetPool) {
        dispatch!(self, effect => effect.cleanup(memory));
    }

    fn metadata(&self) -> EffectMetadata {
        dispatch!(self, effect => effect.metadata())
    }

    fn parameters(&self) -> &'static [ParameterDescriptor] {
        dispatch!(self, effect => effect.parameters())
    }

    fn parameter_value(&self, name: &str) -> Option<f32> {
        dispatch!(self, effect => effect.parameter_value(name))
    }

    fn store_parameter(&mut self, name: &str, value: f32) {
        dispatch!(self, effect => effect.store_parameter(name, value));
    }
}

/// Known built-in effect ids
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum BuiltinEffect {
    Solid = EFFECT_ID_SOLID,
    Rainbow = EFFECT_ID_RAINBOW,
    Fire = EFFECT_ID_FIRE,
    Ocean = EFFECT_ID_OCEAN,
    Confetti = EFFECT_ID_CONFETTI,
    CenterPulse = EFFECT_ID_CENTER_PULSE,
    Breathing = EFFECT_ID_BREATHING,
    Heartbeat = EFFECT_ID_HEARTBEAT,
}

impl BuiltinEffect {
    pub const ALL: [Self; 8] = [
        Self::Solid,
        Self::Rainbow,
        Self::Fire,
        Self::Ocean,
        Self::Confetti,
        Self::CenterPulse,
        Self::Breathing,
        Self::Heartbeat,
    ];

    pub const fn raw(self) -> u8 {
        self as u8
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Solid => EFFECT_NAME_SOLID,
            Self::Rainbow => EFFECT_NAME_RAINBOW,
            Self::Fire => EFFECT_NAME_FIRE,
            Self::Ocean => EFFECT_NAME_OCEAN,
            Self::Confetti => EFFECT_NAME_CONFETTI,
            Self::CenterPulse => EFFECT_NAME_CENTER_PULSE,
            Self::Breathing => EFFECT_NAME_BREATHING,
            Self::Heartbeat => EFFECT_NAME_HEARTBEAT,
        }
    }

    /// Factory constructing a fresh instance of this effect
    pub fn factory(self) -> fn() -> EffectSlot {
        match self {
            Self::Solid => || EffectSlot::Solid(SolidEffect::new()),
            Self::Rainbow => || EffectSlot::Rainbow(RainbowEffect::new()),
            Self::Fire => || EffectSlot::Fire(FireEffect::new()),
            Self::Ocean => || EffectSlot::Ocean(OceanEffect::new()),
            Self::Confetti => || EffectSlot::Confetti(ConfettiEffect::new()),
            Self::CenterPulse => || EffectSlot::CenterPulse(CenterPulseEffect::new()),
            Self::Breathing => || EffectSlot::Breathing(BreathingEffect::new()),
            Self::Heartbeat => || EffectSlot::Heartbeat(HeartbeatEffect::new()),
        }
    }
}

/// Register every built-in effect under its stable id
pub fn register_builtin_effects<const N: usize>(
    registry: &mut EffectRegistry<EffectSlot, N>,
) -> Result<(), RegistryError> {
    for effect in BuiltinEffect::ALL {
        registry.register(effect.raw(), effect.as_str(), effect.factory())?;
    }
    Ok(())
}
