//! The particle record shared by the grid, the compositor and the renderer.

use crate::math::Vec2;

/// A single dot in the grid.
///
/// The origin is fixed for the lifetime of a grid generation. The four
/// render fields are reset at the start of every frame and written only by
/// the compositor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Origin X, set at grid (re)generation
    pub orig_x: f32,
    /// Origin Y, set at grid (re)generation
    pub orig_y: f32,
    /// Current X after composition
    pub x: f32,
    /// Current Y after composition
    pub y: f32,
    /// Current opacity (0-1)
    pub opacity: f32,
    /// Current size multiplier (>= 0)
    pub size: f32,
}

impl Particle {
    /// Creates a particle resting at its origin.
    #[must_use]
    pub const fn at(x: f32, y: f32, opacity: f32) -> Self {
        Self {
            orig_x: x,
            orig_y: y,
            x,
            y,
            opacity,
            size: 1.0,
        }
    }

    /// Origin as a vector
    #[inline]
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        Vec2::new(self.orig_x, self.orig_y)
    }

    /// Current position as a vector
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Puts the render fields back to their resting values.
    #[inline]
    pub fn reset(&mut self, base_opacity: f32) {
        self.x = self.orig_x;
        self.y = self.orig_y;
        self.opacity = base_opacity;
        self.size = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_restores_origin() {
        let mut p = Particle::at(10.0, 20.0, 0.5);
        p.x = 13.0;
        p.y = 17.0;
        p.opacity = 1.0;
        p.size = 2.0;

        p.reset(0.5);
        assert_eq!(p, Particle::at(10.0, 20.0, 0.5));
    }
}
