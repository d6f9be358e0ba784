//! Per-LED mix functions for every transition kind.
//!
//! Each kind maps (progress, position) to a factor in 0..=1 where 0 shows
//! the outgoing frame and 1 the incoming one. Every function is pure, so a
//! frame can be recomputed from its progress alone. Most kinds keep a
//! progress floor so the hand-off always completes.

use core::f32::consts::{PI, TAU};

use embassy_time::Duration;

use crate::color::Rgb;
use crate::easing::EasingCurve;
use crate::math8::{clamp01, qadd8, scale8};
use crate::random::hash32;

const WIPE_EDGE: f32 = 0.1;
const PULSE_COUNT: u8 = 5;
const PULSE_SPACING: f32 = 0.15;
const PULSE_SPAWN_WINDOW: f32 = 0.7;
const PULSE_WIDTH: f32 = 15.0;
const IMPLOSION_GLOW: f32 = 5.0;
const IRIS_FEATHER: f32 = 5.0;
const IRIS_BLADES: f32 = 8.0;
const KALEIDOSCOPE_FOLDS: f32 = 6.0;
const MANDALA_RINGS: [f32; 6] = [0.0, 0.15, 0.35, 0.55, 0.75, 1.0];
const MANDALA_RING_DELAY: f32 = 0.15;
const MANDALA_EDGE: f32 = 0.08;

/// Position of one LED relative to its strip's center pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedPosition {
    /// Index in the whole buffer
    pub index: usize,
    /// Index within its physical strip
    pub local: usize,
    pub strip_len: usize,
    /// Distance from the center pair in LEDs
    pub distance: f32,
    /// Distance from the center pair in 0..=1
    pub normalized: f32,
    /// Largest possible distance on the strip
    pub reach: f32,
}

impl LedPosition {
    #[allow(clippy::cast_precision_loss)]
    fn strip_fraction(&self) -> f32 {
        if self.strip_len == 0 {
            return 0.0;
        }
        self.local as f32 / self.strip_len as f32
    }
}

/// Transition algorithms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionKind {
    /// Uniform cross-fade
    #[default]
    Fade,
    /// Ring expanding from the center
    WipeOut,
    /// Ring collapsing from the edges
    WipeIn,
    /// LEDs flip in random order
    Dissolve,
    /// Interference ripples around a cross-fade
    PhaseShift,
    /// Concentric pulses carry the new frame outward
    Pulsewave,
    /// The edges collapse onto the center
    Implosion,
    /// Bladed aperture opening from the center
    Iris,
    /// Accelerating shockwave with a radiation glow
    Nuclear,
    /// Event horizon that opens, holds and swallows the strip
    Stargate,
    /// Six-fold mirrored sweep
    Kaleidoscope,
    /// Rings switch one after another with petal patterns
    Mandala,
}

impl TransitionKind {
    pub const ALL: [Self; 12] = [
        Self::Fade,
        Self::WipeOut,
        Self::WipeIn,
        Self::Dissolve,
        Self::PhaseShift,
        Self::Pulsewave,
        Self::Implosion,
        Self::Iris,
        Self::Nuclear,
        Self::Stargate,
        Self::Kaleidoscope,
        Self::Mandala,
    ];

    pub fn from_raw(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fade => "fade",
            Self::WipeOut => "wipe_out",
            Self::WipeIn => "wipe_in",
            Self::Dissolve => "dissolve",
            Self::PhaseShift => "phase_shift",
            Self::Pulsewave => "pulsewave",
            Self::Implosion => "implosion",
            Self::Iris => "iris",
            Self::Nuclear => "nuclear",
            Self::Stargate => "stargate",
            Self::Kaleidoscope => "kaleidoscope",
            Self::Mandala => "mandala",
        }
    }

    pub const fn default_duration(self) -> Duration {
        Duration::from_millis(match self {
            Self::Fade => 800,
            Self::WipeOut | Self::WipeIn | Self::Iris => 1200,
            Self::Dissolve | Self::PhaseShift | Self::Implosion => 1500,
            Self::Pulsewave | Self::Kaleidoscope => 2000,
            Self::Nuclear | Self::Mandala => 2500,
            Self::Stargate => 3000,
        })
    }

    /// Easing applied to progress; a fade is always linear
    pub const fn default_curve(self) -> EasingCurve {
        match self {
            Self::Fade | Self::Dissolve => EasingCurve::Linear,
            Self::WipeOut | Self::WipeIn | Self::Iris | Self::Kaleidoscope => {
                EasingCurve::InOutQuad
            }
            Self::PhaseShift | Self::Stargate | Self::Mandala => EasingCurve::InOutCubic,
            Self::Pulsewave | Self::Nuclear => EasingCurve::OutQuad,
            Self::Implosion => EasingCurve::InCubic,
        }
    }

    /// Weighted pick: simple kinds are common, dramatic ones rare
    pub fn random(seed: u32) -> Self {
        match hash32(seed) % 100 {
            0..15 => Self::Fade,
            15..30 => Self::WipeOut,
            30..45 => Self::WipeIn,
            45..60 => Self::Dissolve,
            60..68 => Self::Pulsewave,
            68..76 => Self::Implosion,
            76..85 => Self::Iris,
            85..89 => Self::Nuclear,
            89..93 => Self::Stargate,
            93..96 => Self::PhaseShift,
            96..98 => Self::Kaleidoscope,
            _ => Self::Mandala,
        }
    }

    /// Mix factor for one LED
    ///
    /// `progress` is eased, `raw` is linear time progress.
    pub fn mix(self, progress: f32, raw: f32, led: &LedPosition, seed: u32) -> f32 {
        let p = clamp01(progress);
        if p >= 1.0 {
            return 1.0;
        }
        let factor = match self {
            Self::Fade => p,
            Self::WipeOut => wipe_out(p, led.normalized),
            Self::WipeIn => wipe_in(p, led.normalized),
            Self::Dissolve => dissolve(p, led.index, seed),
            Self::PhaseShift => phase_shift(p, led.normalized),
            Self::Pulsewave => pulsewave(p, clamp01(raw), led).max(p * p),
            Self::Implosion => implosion(p, led).max(p),
            Self::Iris => iris(p, led).max(p * p * p),
            Self::Nuclear => nuclear(p, led).0.max(p),
            Self::Stargate => stargate(p, led).0.max(p * p),
            Self::Kaleidoscope => kaleidoscope(p, led).max(p * p),
            Self::Mandala => mandala(p, led).max(p * p),
        };
        clamp01(factor)
    }

    /// Light added on top of the mixed pixel by the dramatic kinds
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn overlay(self, progress: f32, led: &LedPosition, pixel: Rgb) -> Rgb {
        let p = clamp01(progress);
        match self {
            Self::Nuclear => {
                let radiation = nuclear(p, led).1;
                if radiation <= 0.01 {
                    return pixel;
                }
                let level = (radiation * 130.0) as u8;
                Rgb {
                    r: qadd8(pixel.r, level),
                    g: qadd8(pixel.g, scale8(level, 230)),
                    b: qadd8(pixel.b, scale8(level, 77)),
                }
            }
            Self::Stargate => {
                let glow = stargate(p, led).1;
                if glow <= 0.01 {
                    return pixel;
                }
                let level = (glow.min(1.0) * 126.0) as u8;
                Rgb {
                    r: qadd8(pixel.r, scale8(level, 102)),
                    g: qadd8(pixel.g, scale8(level, 179)),
                    b: qadd8(pixel.b, level),
                }
            }
            _ => pixel,
        }
    }
}

fn wipe_out(p: f32, d: f32) -> f32 {
    let edge_start = p - WIPE_EDGE;
    if d < edge_start {
        1.0
    } else if d < p {
        1.0 - (d - edge_start) / WIPE_EDGE
    } else {
        0.0
    }
}

fn wipe_in(p: f32, d: f32) -> f32 {
    let radius = 1.0 - p;
    let edge_end = radius + WIPE_EDGE;
    if d > edge_end {
        1.0
    } else if d > radius {
        (d - radius) / WIPE_EDGE
    } else {
        0.0
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn dissolve(p: f32, index: usize, seed: u32) -> f32 {
    let threshold = hash32(seed ^ (index as u32).wrapping_mul(0x9e37_79b9)) >> 8;
    let cut = (p * (1u32 << 24) as f32) as u32;
    if threshold < cut { 1.0 } else { 0.0 }
}

fn phase_shift(p: f32, d: f32) -> f32 {
    let phase = p * PI * 4.0;
    let frequency = 3.0 + d * 5.0;
    let wave_phase = phase - d * TAU;
    let wave = (libm::sinf(wave_phase * frequency) + 1.0) * 0.5;
    let influence = 0.3 * (1.0 - libm::fabsf(p - 0.5) * 2.0);
    p + (wave - 0.5) * influence
}

#[allow(clippy::cast_precision_loss)]
fn pulsewave(p: f32, raw: f32, led: &LedPosition) -> f32 {
    let mut total = 0.0_f32;
    for pulse in 0..PULSE_COUNT {
        let spawn = f32::from(pulse) * PULSE_SPACING;
        if raw <= spawn || spawn >= PULSE_SPAWN_WINDOW {
            continue;
        }
        let radius_units = (2.0 * (p - spawn)).max(0.0);
        let intensity = (1.0 - radius_units * 0.15).max(0.0);
        let radius = radius_units * led.reach;
        let gap = libm::fabsf(led.distance - radius);
        if gap < PULSE_WIDTH {
            let mut strength = 1.0 - gap / PULSE_WIDTH;
            strength *= strength * intensity;
            if led.distance < radius {
                total = total.max(strength + (1.0 - strength) * total);
            } else {
                total = total.max(strength * 0.5);
            }
        }
        if led.distance < radius - PULSE_WIDTH * 0.5 {
            total = total.max(intensity);
        }
    }
    total
}

fn implosion(p: f32, led: &LedPosition) -> f32 {
    // Collapse front accelerates from the edge towards the center
    let front = (1.0 - p * p) * led.reach;
    let mut blend = if led.distance > front {
        1.0
    } else {
        (1.0 - led.normalized) * p * 2.0
    };
    let gap = libm::fabsf(led.distance - front);
    if gap < IMPLOSION_GLOW {
        blend = blend.max(1.0 - gap / IMPLOSION_GLOW);
    }
    blend
}

fn iris(p: f32, led: &LedPosition) -> f32 {
    let radius = p * led.reach;
    let position = led.strip_fraction() * 2.0 - 1.0;
    let angle = libm::atan2f(position, 0.5) + p * PI * 0.5;
    let blades = (libm::sinf(angle * IRIS_BLADES) + 1.0) * 0.5;
    let effective = radius * (0.85 + blades * 0.15);
    if led.distance < effective - IRIS_FEATHER {
        1.0
    } else if led.distance < effective {
        1.0 - (led.distance - (effective - IRIS_FEATHER)) / IRIS_FEATHER
    } else {
        0.0
    }
}

/// Returns (mix, radiation)
fn nuclear(p: f32, led: &LedPosition) -> (f32, f32) {
    let shock_radius = p * p * led.reach * 1.3;
    let intensity = libm::sinf(p * PI);
    let width = 12.0 + p * 8.0;
    let from_shock = led.distance - shock_radius;
    if from_shock < -width {
        let behind = libm::fabsf(from_shock + width);
        let afterglow = (1.0 - behind * 0.7 * 0.05).max(0.0);
        (1.0, afterglow * intensity * 0.3)
    } else if from_shock < width {
        let position = (from_shock + width) / (width * 2.0);
        let radiation = (1.0 - libm::fabsf(position - 0.5) * 2.0) * intensity;
        (1.0 - position, radiation)
    } else {
        (0.0, 0.0)
    }
}

/// Returns (mix, portal glow)
fn stargate(p: f32, led: &LedPosition) -> (f32, f32) {
    let target = led.reach * 0.8;
    let horizon = if p < 0.3 {
        let open = p / 0.3;
        target * (1.0 + 0.3 * libm::sinf(open * PI)) * open
    } else if p < 0.7 {
        target
    } else {
        target + (led.reach - target) * ((p - 0.7) / 0.3)
    };
    let kawoosh = if p < 0.2 {
        libm::sinf(p / 0.2 * PI)
    } else {
        0.0
    };
    let chevron = p * TAU * 3.0;
    let swirl = (libm::sinf((chevron + led.normalized * TAU) * 9.0) + 1.0) * 0.5;

    let core = horizon * 0.8;
    if horizon > 0.0 && led.distance < core {
        (1.0, led.distance / core * 0.3)
    } else if led.distance < horizon {
        let edge = (led.distance - core) / (horizon * 0.2);
        (1.0 - edge, (1.0 - libm::fabsf(edge - 0.5) * 2.0) * (0.5 + swirl * 0.5))
    } else if kawoosh > 0.0 {
        let range = 30.0 * kawoosh;
        let from_horizon = led.distance - horizon;
        let glow = if from_horizon < range {
            kawoosh * (1.0 - from_horizon / range)
        } else {
            0.0
        };
        (0.0, glow)
    } else {
        (0.0, 0.0)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn kaleidoscope(p: f32, led: &LedPosition) -> f32 {
    let fold = TAU / KALEIDOSCOPE_FOLDS;
    let rotation = (1.0 - libm::cosf(p * PI)) * 0.5 * PI;
    let angle = led.strip_fraction() * PI + rotation;
    let mut folded = libm::fmodf(angle, fold);
    if (angle / fold) as i32 % 2 == 1 {
        folded = fold - folded;
    }
    let fold_t = folded / fold;
    let edge = 1.0 - libm::fabsf(fold_t - 0.5) * 2.0;
    let mut blend = p * (0.5 + edge * 0.3 + (1.0 - led.normalized) * 0.2);
    let boundary = fold_t.min(1.0 - fold_t) * fold;
    if boundary < 0.1 && p > 0.2 && p < 0.8 {
        blend = (blend + 0.4).min(1.0);
    }
    blend
}

fn mandala_ring_phase(p: f32, ring: usize) -> f32 {
    #[allow(clippy::cast_precision_loss)]
    let delay = ring as f32 * MANDALA_RING_DELAY;
    ((p - delay) / (1.0 - delay)).max(0.0)
}

#[allow(clippy::cast_precision_loss)]
fn mandala(p: f32, led: &LedPosition) -> f32 {
    let d = led.normalized;
    let ring = (0..MANDALA_RINGS.len() - 1)
        .find(|&ring| d >= MANDALA_RINGS[ring] && d < MANDALA_RINGS[ring + 1])
        .unwrap_or(MANDALA_RINGS.len() - 2);
    let (start, end) = (MANDALA_RINGS[ring], MANDALA_RINGS[ring + 1]);
    let in_ring = clamp01((d - start) / (end - start));
    let phase = mandala_ring_phase(p, ring);

    let petals = 4.0 + ring as f32 * 2.0;
    let petal_angle = led.strip_fraction() * TAU;
    let pattern = (libm::sinf(petal_angle * petals + phase * PI) + 1.0) * 0.5;
    let influence = 0.25 * (1.0 - libm::fabsf(phase - 0.5) * 2.0);
    let mut blend = phase * (1.0 - influence) + pattern * influence;

    if in_ring < MANDALA_EDGE && ring > 0 {
        let t = in_ring / MANDALA_EDGE;
        blend = blend * t + mandala_ring_phase(p, ring - 1) * (1.0 - t);
    }
    if 1.0 - in_ring < MANDALA_EDGE && ring < MANDALA_RINGS.len() - 2 {
        let t = (1.0 - in_ring) / MANDALA_EDGE;
        blend = blend * t + mandala_ring_phase(p, ring + 1) * (1.0 - t);
    }
    blend
}
