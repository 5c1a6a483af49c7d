//! Easing curves shared by the animated effects.

/// Easing function type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    /// Linear interpolation.
    #[default]
    Linear,
    /// Quadratic ease-out: fast start, settles at the end.
    QuadOut,
    /// Cubic ease-in-out.
    CubicInOut,
    /// Half sine bump: 0 at both ends, 1 in the middle.
    SineBump,
}

impl Easing {
    /// Applies the easing function to a t value (0-1).
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Self::Linear => t,
            Self::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Self::SineBump => (std::f32::consts::PI * t).sin(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        for easing in [Easing::Linear, Easing::QuadOut, Easing::CubicInOut] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6);
        }
        assert!(Easing::SineBump.apply(1.0).abs() < 1e-6);
        assert!((Easing::SineBump.apply(0.5) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cubic_in_out_symmetry() {
        assert!((Easing::CubicInOut.apply(0.5) - 0.5).abs() < 1e-6);
        let a = Easing::CubicInOut.apply(0.2);
        let b = Easing::CubicInOut.apply(0.8);
        assert!((a + b - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_clamps_input() {
        assert_eq!(Easing::QuadOut.apply(-1.0), 0.0);
        assert_eq!(Easing::QuadOut.apply(2.0), 1.0);
    }
}
