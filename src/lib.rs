#![no_std]

#[cfg(feature = "esp32-log")]
macro_rules! engine_log {
    ($($arg:tt)*) => {{
        esp_println::println!($($arg)*);
    }};
}

#[cfg(not(feature = "esp32-log"))]
macro_rules! engine_log {
    ($($arg:tt)*) => {{
        let _ = format_args!($($arg)*);
    }};
}

pub mod bus;
pub mod color;
pub mod command;
pub mod easing;
pub mod effect;
pub mod frame_scheduler;
pub mod geometry;
pub mod math8;
pub mod narrative;
pub mod random;
pub mod registry;
pub mod render_actor;
pub mod stats;
pub mod transition;
pub mod zone;

pub use bus::{CommandSender, EffectCatalog, EngineBus, EngineStatus};
pub use command::{Command, EnqueueError, NarrativeCommand};
pub use effect::{
    BuiltinEffect, Effect, EffectContext, EffectMetadata, EffectSlot, InitError,
    register_builtin_effects,
};
pub use frame_scheduler::FrameScheduler;
pub use narrative::{NarrativeConfig, NarrativeEngine, NarrativePhase};
pub use registry::{EffectRegistry, RegistryError};
pub use render_actor::{ApplyError, EngineConfig, RenderActor};
pub use stats::{FrameRendered, RenderStats};
pub use transition::{TransitionEngine, TransitionKind};
pub use zone::{BlendMode, Layout, LayoutPreset, ZoneComposer, ZoneSegment, ZoneState};

pub use color::{Hsv, Palette, Rgb};
pub use easing::EasingCurve;
pub use embassy_time::{Duration, Instant};

/// Abstract LED driver trait
///
/// Implement this trait to support different hardware platforms.
/// The render actor is generic over this trait.
pub trait OutputDriver {
    /// Write colors to the LED strip
    fn write(&mut self, colors: &[Rgb]);
}

/// Source of frame timestamps
///
/// The render actor reads time only through this trait, so tests can drive
/// it with a manual clock.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// [`Clock`] backed by the embassy-time driver
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
