//! Built-in zone presets.

use crate::effect::BuiltinEffect;

use super::blend::BlendMode;
use super::layout::{LayoutPreset, MAX_ZONES};
use super::ZoneState;

/// A named layout plus a configuration for every zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZonePreset {
    pub name: &'static str,
    pub layout: LayoutPreset,
    pub zones: [ZoneState; MAX_ZONES],
}

const fn zone(
    effect: BuiltinEffect,
    brightness: u8,
    speed: u8,
    blend_mode: BlendMode,
    enabled: bool,
) -> ZoneState {
    ZoneState::new(Some(effect.raw()), brightness, speed, blend_mode, enabled)
}

const OFF: ZoneState = ZoneState::new(None, 255, 15, BlendMode::Overwrite, false);

pub const ZONE_PRESETS: [ZonePreset; 5] = [
    ZonePreset {
        name: "Unified",
        layout: LayoutPreset::Triple,
        zones: [
            zone(BuiltinEffect::Rainbow, 255, 15, BlendMode::Overwrite, true),
            OFF,
            OFF,
            OFF,
        ],
    },
    ZonePreset {
        name: "Dual Split",
        layout: LayoutPreset::Triple,
        zones: [
            zone(BuiltinEffect::Fire, 255, 15, BlendMode::Overwrite, true),
            zone(BuiltinEffect::Ocean, 200, 20, BlendMode::Additive, true),
            zone(BuiltinEffect::Ocean, 200, 20, BlendMode::Additive, false),
            OFF,
        ],
    },
    ZonePreset {
        name: "Triple Rings",
        layout: LayoutPreset::Triple,
        zones: [
            zone(BuiltinEffect::CenterPulse, 255, 20, BlendMode::Overwrite, true),
            zone(BuiltinEffect::Confetti, 220, 25, BlendMode::Additive, true),
            zone(BuiltinEffect::Rainbow, 180, 30, BlendMode::Additive, true),
            OFF,
        ],
    },
    ZonePreset {
        name: "Quad Active",
        layout: LayoutPreset::Quad,
        zones: [
            zone(BuiltinEffect::Fire, 255, 15, BlendMode::Overwrite, true),
            zone(BuiltinEffect::Rainbow, 230, 20, BlendMode::Additive, true),
            zone(BuiltinEffect::CenterPulse, 200, 25, BlendMode::Additive, true),
            zone(BuiltinEffect::Ocean, 170, 30, BlendMode::Additive, true),
        ],
    },
    ZonePreset {
        name: "Heartbeat Focus",
        layout: LayoutPreset::Triple,
        zones: [
            zone(BuiltinEffect::Heartbeat, 255, 15, BlendMode::Overwrite, true),
            zone(BuiltinEffect::Breathing, 150, 10, BlendMode::Alpha, true),
            zone(BuiltinEffect::Breathing, 100, 8, BlendMode::Alpha, true),
            OFF,
        ],
    },
];

pub fn preset_name(index: u8) -> Option<&'static str> {
    ZONE_PRESETS.get(usize::from(index)).map(|preset| preset.name)
}
