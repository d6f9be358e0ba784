#![allow(dead_code)]

use lightwave_engine::color::Rgb;
use lightwave_engine::effect::{
    Effect, EffectCategory, EffectContext, EffectMetadata, InitError, ParameterDescriptor,
};
use lightwave_engine::registry::EffectRegistry;
use lightwave_engine::{Clock, Duration, Instant, OutputDriver};

pub const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };
pub const GREEN: Rgb = Rgb { r: 0, g: 255, b: 0 };
pub const BLUE: Rgb = Rgb { r: 0, g: 0, b: 255 };

pub const RED_ID: u8 = 0;
pub const BLUE_ID: u8 = 1;
pub const GREEN_ID: u8 = 2;
pub const STARVED_ID: u8 = 8;
pub const FAILING_ID: u8 = 9;

const PARAMS: &[ParameterDescriptor] = &[ParameterDescriptor::new("level", 0.0, 1.0, 1.0)];

/// Effect that paints one flat color, or refuses to start
///
/// `Failing` never supports the strip; `Starved` always finds the working
/// set pool empty.
#[derive(Debug, Clone)]
pub enum TestEffect {
    Fill { color: Rgb, level: f32 },
    Failing,
    Starved,
}

impl TestEffect {
    pub const fn fill(color: Rgb) -> Self {
        Self::Fill { color, level: 1.0 }
    }
}

impl Effect for TestEffect {
    fn init(&mut self, _ctx: &mut EffectContext<'_>) -> Result<(), InitError> {
        match self {
            Self::Fill { .. } => Ok(()),
            Self::Failing => Err(InitError::Unsupported),
            Self::Starved => Err(InitError::WorkingSetExhausted),
        }
    }

    fn render(&mut self, ctx: &mut EffectContext<'_>) {
        if let Self::Fill { color, level } = self {
            let scale = (*level * 255.0) as u8;
            ctx.fill(lightwave_engine::color::scale_color(*color, scale));
        }
    }

    fn metadata(&self) -> EffectMetadata {
        EffectMetadata {
            name: "Test",
            description: "Flat test color",
            category: EffectCategory::Utility,
            version: 1,
        }
    }

    fn parameters(&self) -> &'static [ParameterDescriptor] {
        PARAMS
    }

    fn parameter_value(&self, name: &str) -> Option<f32> {
        match (self, name) {
            (Self::Fill { level, .. }, "level") => Some(*level),
            _ => None,
        }
    }

    fn store_parameter(&mut self, name: &str, value: f32) {
        if let (Self::Fill { level, .. }, "level") = (self, name) {
            *level = value;
        }
    }
}

pub fn test_registry<const N: usize>() -> EffectRegistry<TestEffect, N> {
    let mut registry = EffectRegistry::new();
    registry
        .register(RED_ID, "red", || TestEffect::fill(RED))
        .unwrap();
    registry
        .register(BLUE_ID, "blue", || TestEffect::fill(BLUE))
        .unwrap();
    registry
        .register(GREEN_ID, "green", || TestEffect::fill(GREEN))
        .unwrap();
    registry
        .register(FAILING_ID, "failing", || TestEffect::Failing)
        .unwrap();
    registry
        .register(STARVED_ID, "starved", || TestEffect::Starved)
        .unwrap();
    registry
}

/// Clock advanced by hand
#[derive(Debug, Clone, Copy)]
pub struct ManualClock {
    now: Instant,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Instant::from_millis(1_000),
        }
    }

    pub fn advance(&mut self, ms: u64) {
        self.now += Duration::from_millis(ms);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now
    }
}

/// Driver that keeps the last written frame
#[derive(Debug, Default)]
pub struct CaptureDriver {
    pub writes: usize,
    pub last: Vec<Rgb>,
}

impl OutputDriver for CaptureDriver {
    fn write(&mut self, colors: &[Rgb]) {
        self.writes += 1;
        self.last.clear();
        self.last.extend_from_slice(colors);
    }
}
