//! Responsive particle grid.
//!
//! The grid turns a container size, a density and a padding into a regular
//! lattice of particle origins. It owns the canonical particle list and
//! synchronously notifies its observers every time that list is regenerated.
//!
//! ```text
//! padding ┌───────────────────────────┐
//!    ↓    │ ◆     ◆     ◆     ◆     ◆ │   cols = floor(avail_w / spacing)
//!         │                           │   rows = floor(avail_h / spacing)
//!         │ ◆     ◆     ◆     ◆     ◆ │
//!         │                           │   index = col * rows + row
//!         │ ◆     ◆     ◆     ◆     ◆ │
//!         └───────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::math::Size;
use crate::options::Options;
use crate::particle::Particle;

/// Base lattice spacing in pixels before density and responsive scaling.
pub const BASE_SPACING: f32 = 20.0;

/// How strongly the configured density moves the spacing away from the base.
pub const DENSITY_DAMPING: f32 = 0.3;

/// One row of the responsive breakpoint table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    /// Largest viewport width (inclusive) this row applies to.
    pub max_width: f32,
    /// Multiplier for the particle draw radius.
    pub size_scale: f32,
    /// Multiplier for the lattice spacing.
    pub density_scale: f32,
}

impl Breakpoint {
    /// Creates a breakpoint row.
    #[must_use]
    pub const fn new(max_width: f32, size_scale: f32, density_scale: f32) -> Self {
        Self {
            max_width,
            size_scale,
            density_scale,
        }
    }
}

/// Default breakpoint table. Wider viewports use `ResponsiveScale::UNIT`.
pub const DEFAULT_BREAKPOINTS: [Breakpoint; 4] = [
    Breakpoint::new(400.0, 0.8, 0.9),
    Breakpoint::new(600.0, 0.85, 0.925),
    Breakpoint::new(900.0, 0.9, 0.95),
    Breakpoint::new(1200.0, 0.95, 0.975),
];

/// Responsive multipliers for the current viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponsiveScale {
    /// Particle radius multiplier
    pub size: f32,
    /// Lattice spacing multiplier
    pub density: f32,
}

impl ResponsiveScale {
    /// No scaling (largest bucket).
    pub const UNIT: Self = Self {
        size: 1.0,
        density: 1.0,
    };
}

/// Grid configuration. Fixed after setup, re-derived on resize.
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    /// Base spacing divisor; lower is denser.
    pub density: f32,
    /// Inner margin excluded from placement.
    pub padding: f32,
    /// Multiplies the computed particle radius.
    pub particle_size_factor: f32,
    /// Target updates per second.
    pub frame_rate_hint: f32,
    /// Opacity of a particle no effect touches.
    pub base_opacity: f32,
    /// Ascending by `max_width`; the first matching row wins.
    pub breakpoints: Vec<Breakpoint>,
}

impl GridConfig {
    /// Default density.
    pub const DEFAULT_DENSITY: f32 = 2.0;
    /// Default frame-rate hint.
    pub const DEFAULT_FRAME_RATE: f32 = 45.0;

    /// Reads the `grid-*` options, falling back to defaults for anything
    /// missing or malformed.
    #[must_use]
    pub fn from_options(options: &Options) -> Self {
        let defaults = Self::default();
        Self {
            density: options.number_where("grid-density", defaults.density, |d| d > 0.0),
            padding: options
                .number_where("grid-padding", defaults.padding, |p| p >= 0.0)
                .floor(),
            particle_size_factor: options.number_where(
                "grid-size",
                defaults.particle_size_factor,
                |s| s > 0.0,
            ),
            frame_rate_hint: options
                .number_where("grid-frame-rate", defaults.frame_rate_hint, |f| f >= 1.0)
                .floor(),
            base_opacity: options.number_where("grid-opacity", defaults.base_opacity, |o| {
                (0.0..=1.0).contains(&o)
            }),
            breakpoints: options
                .breakpoints()
                .map_or(defaults.breakpoints, <[Breakpoint]>::to_vec),
        }
    }

    /// Multipliers for a viewport of the given width.
    #[must_use]
    pub fn responsive_scale(&self, viewport_width: f32) -> ResponsiveScale {
        self.breakpoints
            .iter()
            .find(|b| viewport_width <= b.max_width)
            .map_or(ResponsiveScale::UNIT, |b| ResponsiveScale {
                size: b.size_scale,
                density: b.density_scale,
            })
    }

    /// Density compressed towards 1 so extreme values stay usable.
    #[must_use]
    pub fn normalized_density(&self) -> f32 {
        1.0 + (self.density - 1.0) * DENSITY_DAMPING
    }

    /// Lattice spacing in pixels for a viewport width.
    #[must_use]
    pub fn spacing(&self, viewport_width: f32) -> f32 {
        BASE_SPACING * self.normalized_density() * self.responsive_scale(viewport_width).density
    }

    /// Particle draw radius in pixels for a viewport width.
    #[must_use]
    pub fn particle_size(&self, viewport_width: f32) -> f32 {
        self.particle_size_factor * self.responsive_scale(viewport_width).size
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            density: Self::DEFAULT_DENSITY,
            padding: 0.0,
            particle_size_factor: 1.0,
            frame_rate_hint: Self::DEFAULT_FRAME_RATE,
            base_opacity: 1.0,
            breakpoints: DEFAULT_BREAKPOINTS.to_vec(),
        }
    }
}

/// Logical lattice dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridDims {
    /// Number of columns (>= 1 once generated)
    pub cols: usize,
    /// Number of rows (>= 1 once generated)
    pub rows: usize,
}

impl GridDims {
    /// Total particle count.
    #[must_use]
    pub const fn len(self) -> usize {
        self.cols * self.rows
    }

    /// Returns true if the grid has not been generated.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Particle index of a lattice cell.
    #[inline]
    #[must_use]
    pub const fn index(self, col: usize, row: usize) -> usize {
        col * self.rows + row
    }

    /// Lattice cell of a particle index, or `None` if it lies outside the lattice.
    #[inline]
    #[must_use]
    pub const fn cell(self, index: usize) -> Option<(usize, usize)> {
        if index >= self.len() {
            return None;
        }
        Some((index / self.rows, index % self.rows))
    }
}

/// Notice delivered after every regeneration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reinitialized {
    /// Generation number of the new particle list.
    pub generation: u64,
    /// New lattice dimensions.
    pub dims: GridDims,
    /// New particle count (`dims.len()`).
    pub particle_count: usize,
    /// Canvas size the grid was generated for.
    pub canvas: Size,
}

type Observer = Box<dyn FnMut(&Reinitialized) + Send>;

/// The particle grid for one host.
pub struct ParticleGrid {
    config: GridConfig,
    container: Size,
    viewport_width: f32,
    particles: Vec<Particle>,
    dims: GridDims,
    generation: u64,
    observers: Vec<Observer>,
}

impl ParticleGrid {
    /// Creates an empty grid. Call [`Self::generate`] to place particles.
    #[must_use]
    pub fn new(config: GridConfig, container: Size, viewport_width: f32) -> Self {
        Self {
            config,
            container,
            viewport_width,
            particles: Vec::new(),
            dims: GridDims::default(),
            generation: 0,
            observers: Vec::new(),
        }
    }

    /// Replaces the container size, viewport width and configuration.
    ///
    /// Does not regenerate; call [`Self::generate`] afterwards.
    pub fn configure(&mut self, container: Size, viewport_width: f32, config: GridConfig) {
        self.container = container;
        self.viewport_width = viewport_width;
        self.config = config;
    }

    /// Updates only the container geometry.
    pub fn resize(&mut self, container: Size, viewport_width: f32) {
        self.container = container;
        self.viewport_width = viewport_width;
    }

    /// Mutable access to the configuration for density/padding/size changes.
    pub fn config_mut(&mut self) -> &mut GridConfig {
        &mut self.config
    }

    /// Registers an observer called synchronously after every regeneration.
    pub fn subscribe(&mut self, observer: impl FnMut(&Reinitialized) + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Regenerates the particle list and notifies observers exactly once.
    pub fn generate(&mut self) -> Reinitialized {
        let spacing = self.config.spacing(self.viewport_width);
        let padding = self.config.padding;
        let avail_w = self.container.width - padding * 2.0;
        let avail_h = self.container.height - padding * 2.0;

        let (cols, first_x, step_x) = axis_layout(avail_w, spacing, padding, self.container.width);
        let (rows, first_y, step_y) = axis_layout(avail_h, spacing, padding, self.container.height);

        let base_opacity = self.config.base_opacity;
        self.particles.clear();
        self.particles.reserve(cols * rows);
        for col in 0..cols {
            let x = first_x + col as f32 * step_x;
            for row in 0..rows {
                let y = first_y + row as f32 * step_y;
                self.particles.push(Particle::at(x, y, base_opacity));
            }
        }

        self.dims = GridDims { cols, rows };
        self.generation += 1;

        let notice = Reinitialized {
            generation: self.generation,
            dims: self.dims,
            particle_count: self.particles.len(),
            canvas: self.container,
        };

        tracing::debug!(
            "grid regenerated: {}x{} particles, spacing {:.1}, generation {}",
            cols,
            rows,
            spacing,
            self.generation
        );

        for observer in &mut self.observers {
            observer(&notice);
        }

        notice
    }

    /// Current particle list.
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutable particle list for the compositor.
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Current lattice dimensions.
    #[must_use]
    pub fn dims(&self) -> GridDims {
        self.dims
    }

    /// Current generation (0 before the first generation).
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Current container size.
    #[must_use]
    pub fn container(&self) -> Size {
        self.container
    }

    /// Viewport width the grid was last laid out for.
    #[must_use]
    pub fn viewport_width(&self) -> f32 {
        self.viewport_width
    }

    /// Particle draw radius for the current viewport.
    #[must_use]
    pub fn particle_size(&self) -> f32 {
        self.config.particle_size(self.viewport_width)
    }
}

/// Returns `(count, first coordinate, step)` along one axis.
///
/// With no usable space the single particle sits at the container centre.
fn axis_layout(avail: f32, spacing: f32, padding: f32, dimension: f32) -> (usize, f32, f32) {
    if !(avail > 0.0) {
        return (1, dimension.max(0.0) / 2.0, 0.0);
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = ((avail / spacing).floor() as usize).max(1);
    if count == 1 {
        (1, padding + avail / 2.0, 0.0)
    } else {
        (count, padding, avail / (count - 1) as f32)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn grid(width: f32, height: f32, config: GridConfig) -> ParticleGrid {
        ParticleGrid::new(config, Size::new(width, height), 1920.0)
    }

    #[test]
    fn test_responsive_scale_smallest_match_wins() {
        let config = GridConfig::default();
        assert_eq!(config.responsive_scale(320.0).size, 0.8);
        assert_eq!(config.responsive_scale(400.0).size, 0.8);
        assert_eq!(config.responsive_scale(401.0).size, 0.85);
        assert_eq!(config.responsive_scale(1200.0).density, 0.975);
        assert_eq!(config.responsive_scale(2560.0), ResponsiveScale::UNIT);
    }

    #[test]
    fn test_density_is_dampened() {
        let config = GridConfig {
            density: 11.0,
            ..GridConfig::default()
        };
        assert!((config.normalized_density() - 4.0).abs() < 1e-6);
        assert!((config.spacing(1920.0) - 80.0).abs() < 1e-4);
    }

    #[test]
    fn test_five_by_five() {
        let config = GridConfig {
            density: 10.0,
            ..GridConfig::default()
        };
        let mut grid = grid(400.0, 400.0, config);
        let notice = grid.generate();

        assert_eq!(notice.dims, GridDims { cols: 5, rows: 5 });
        assert_eq!(grid.particles().len(), 25);
        // Column-major layout
        assert_eq!(grid.particles()[1].orig_x, 0.0);
        assert_eq!(grid.particles()[1].orig_y, 100.0);
        assert_eq!(grid.particles()[24].orig_x, 400.0);
    }

    #[test]
    fn test_particles_within_padding() {
        for (w, h, density, padding) in [
            (400.0, 300.0, 2.0, 0.0),
            (1024.0, 640.0, 1.0, 32.0),
            (57.0, 903.0, 5.5, 12.0),
            (33.0, 33.0, 2.0, 16.0),
        ] {
            let config = GridConfig {
                density,
                padding,
                ..GridConfig::default()
            };
            let mut grid = grid(w, h, config);
            grid.generate();

            assert!(grid.dims().cols >= 1 && grid.dims().rows >= 1);
            for p in grid.particles() {
                assert!(p.orig_x >= padding - 1e-3 && p.orig_x <= w - padding + 1e-3);
                assert!(p.orig_y >= padding - 1e-3 && p.orig_y <= h - padding + 1e-3);
            }
        }
    }

    #[test]
    fn test_no_space_single_centered_particle() {
        let config = GridConfig {
            padding: 50.0,
            ..GridConfig::default()
        };
        let mut grid = grid(80.0, 60.0, config);
        grid.generate();

        assert_eq!(grid.particles().len(), 1);
        assert_eq!(grid.particles()[0].origin(), crate::math::Vec2::new(40.0, 30.0));
    }

    #[test]
    fn test_one_notification_per_generation() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);

        let mut grid = grid(200.0, 200.0, GridConfig::default());
        grid.subscribe(move |notice| {
            assert_eq!(notice.particle_count, notice.dims.len());
            seen.fetch_add(1, Ordering::SeqCst);
        });

        grid.generate();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        grid.resize(Size::new(300.0, 100.0), 800.0);
        let notice = grid.generate();
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(notice.generation, 2);
        assert_eq!(grid.particles().len(), notice.particle_count);
    }

    #[test]
    fn test_dims_index_roundtrip() {
        let dims = GridDims { cols: 7, rows: 3 };
        assert_eq!(dims.index(2, 1), 7);
        assert_eq!(dims.cell(7), Some((2, 1)));
        assert_eq!(dims.cell(21), None);
        assert_eq!(GridDims::default().cell(0), None);
    }
}
