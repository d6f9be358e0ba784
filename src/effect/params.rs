use core::fmt;

/// Declared tunable of an effect
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterDescriptor {
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub step: f32,
    pub unit: &'static str,
}

impl ParameterDescriptor {
    pub const fn new(name: &'static str, min: f32, max: f32, default: f32) -> Self {
        Self {
            name,
            min,
            max,
            default,
            step: 0.0,
            unit: "",
        }
    }

    #[must_use]
    pub const fn with_step(mut self, step: f32) -> Self {
        self.step = step;
        self
    }

    #[must_use]
    pub const fn with_unit(mut self, unit: &'static str) -> Self {
        self.unit = unit;
        self
    }

    /// Check a candidate value against the declared range
    pub fn validate(&self, value: f32) -> Result<(), ParameterError> {
        if !value.is_finite() {
            return Err(ParameterError::NotFinite);
        }
        if value < self.min || value > self.max {
            return Err(ParameterError::OutOfRange);
        }
        Ok(())
    }
}

/// Why a parameter update was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterError {
    /// The effect declares no parameter with that name
    Unknown,
    OutOfRange,
    NotFinite,
}

impl fmt::Display for ParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown parameter"),
            Self::OutOfRange => f.write_str("parameter value out of range"),
            Self::NotFinite => f.write_str("parameter value is not finite"),
        }
    }
}
