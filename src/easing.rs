//! Easing curves shared by transitions and the narrative conductor.

use core::f32::consts::PI;

/// Shape applied to a linear 0..1 progress value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EasingCurve {
    #[default]
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    OutElastic,
    OutBounce,
    OutBack,
}

impl EasingCurve {
    pub const ALL: [Self; 10] = [
        Self::Linear,
        Self::InQuad,
        Self::OutQuad,
        Self::InOutQuad,
        Self::InCubic,
        Self::OutCubic,
        Self::InOutCubic,
        Self::OutElastic,
        Self::OutBounce,
        Self::OutBack,
    ];

    pub fn from_raw(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }

    /// Apply the curve to `t`, clamped to 0..=1 first
    ///
    /// Every curve maps 0 to 0 and 1 to 1. Elastic and back overshoot in
    /// between.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => t * (2.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => {
                let f = t - 1.0;
                f * f * f + 1.0
            }
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let f = 2.0 * t - 2.0;
                    0.5 * f * f * f + 1.0
                }
            }
            Self::OutElastic => {
                if t <= 0.0 || t >= 1.0 {
                    return t;
                }
                let period = 0.3;
                libm::powf(2.0, -10.0 * t) * libm::sinf((t - period / 4.0) * (2.0 * PI) / period)
                    + 1.0
            }
            Self::OutBounce => out_bounce(t),
            Self::OutBack => {
                let overshoot = 1.701_58;
                let f = t - 1.0;
                f * f * ((overshoot + 1.0) * f + overshoot) + 1.0
            }
        }
    }
}

fn out_bounce(t: f32) -> f32 {
    const N: f32 = 7.5625;
    const D: f32 = 2.75;
    if t < 1.0 / D {
        N * t * t
    } else if t < 2.0 / D {
        let t = t - 1.5 / D;
        N * t * t + 0.75
    } else if t < 2.5 / D {
        let t = t - 2.25 / D;
        N * t * t + 0.9375
    } else {
        let t = t - 2.625 / D;
        N * t * t + 0.984_375
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        for curve in EasingCurve::ALL {
            assert!(curve.apply(0.0).abs() < 0.001, "{curve:?} at 0");
            assert!((curve.apply(1.0) - 1.0).abs() < 0.001, "{curve:?} at 1");
        }
    }

    #[test]
    fn test_linear_is_identity() {
        assert!((EasingCurve::Linear.apply(0.37) - 0.37).abs() < f32::EPSILON);
    }

    #[test]
    fn test_quad_shapes() {
        assert!(EasingCurve::InQuad.apply(0.5) < 0.5);
        assert!(EasingCurve::OutQuad.apply(0.5) > 0.5);
        assert!((EasingCurve::InOutQuad.apply(0.5) - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_clamps_input() {
        assert!((EasingCurve::InCubic.apply(2.0) - 1.0).abs() < f32::EPSILON);
        assert!(EasingCurve::OutCubic.apply(-1.0).abs() < f32::EPSILON);
    }
}
