//! Ripple effect.
//!
//! A click or tap starts a ring at the event position. The ring expands with
//! a quadratic ease-out and its strength follows a half-sine over the
//! ripple's lifetime. Particles near the ring are pushed radially outward.
//!
//! ```text
//!   t        = (now - start) / duration          removed once t > 1
//!   radius   = max_radius * (1 - (1 - t)^2)
//!   strength = sin(pi * t)
//!   n        = |d - radius| / max_radius         contributes while n <= thickness
//!   s        = (1 - n / thickness) * strength
//! ```

use meshgrid_core::effect::prepare_buffer;
use meshgrid_core::interaction::Gesture;
use meshgrid_core::options::Options;
use meshgrid_core::{
    Effect, EffectContribution, EffectOutput, EffectSetup, Frame, KeepAlive, Particle,
    Reinitialized, Size, Vec2,
};

use crate::easing::Easing;

/// Registry name.
pub const NAME: &str = "ripple";

/// Squared distance under which a particle sits on the ripple centre.
const MIN_DISTANCE_SQ: f32 = 0.01;

/// Ripple tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RippleConfig {
    /// Lifetime in seconds.
    pub duration: f64,
    /// Peak displacement in pixels.
    pub amplitude: f32,
    /// Ring half-width as a fraction of the max radius.
    pub thickness: f32,
    /// Max radius as a multiple of the larger canvas dimension.
    pub max_radius_factor: f32,
    /// Modulate particle opacity.
    pub affect_opacity: bool,
    /// Modulate particle size.
    pub affect_size: bool,
}

impl RippleConfig {
    /// Reads `ripple-*` overrides.
    #[must_use]
    pub fn from_options(options: &Options) -> Self {
        let d = Self::default();
        let mut config = Self {
            duration: options
                .number("ripple-duration")
                .filter(|v| *v > 0.0)
                .map_or(d.duration, f64::from),
            amplitude: options.number_where("ripple-amplitude", d.amplitude, |v| v >= 0.0),
            thickness: options.number_where("ripple-thickness", d.thickness, |v| v > 0.0),
            max_radius_factor: options.number_where("ripple-max-radius", d.max_radius_factor, |v| {
                v > 0.0
            }),
            affect_opacity: false,
            affect_size: false,
        };
        for word in options.words("ripple-affect") {
            match word {
                "opacity" => config.affect_opacity = true,
                "size" => config.affect_size = true,
                other => tracing::warn!("unknown ripple-affect value ignored: {}", other),
            }
        }
        config
    }

    /// Ring radius in pixels at progress `t`.
    #[must_use]
    pub fn ring_radius(&self, t: f32, canvas: Size) -> f32 {
        self.max_radius(canvas) * Easing::QuadOut.apply(t)
    }

    /// Ring strength at progress `t`.
    #[must_use]
    pub fn ring_strength(t: f32) -> f32 {
        Easing::SineBump.apply(t)
    }

    /// Largest ring radius for a canvas.
    #[must_use]
    pub fn max_radius(&self, canvas: Size) -> f32 {
        canvas.max_dimension() * self.max_radius_factor
    }
}

impl Default for RippleConfig {
    fn default() -> Self {
        Self {
            duration: 1.2,
            amplitude: 15.0,
            thickness: 0.15,
            max_radius_factor: 1.5,
            affect_opacity: false,
            affect_size: false,
        }
    }
}

/// One live ripple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RippleRecord {
    /// Centre in canvas space.
    pub center: Vec2,
    /// Creation time in seconds.
    pub start_time: f64,
    /// Progress at the last update (0-1).
    pub progress: f32,
}

/// Click and tap ripples.
#[derive(Debug)]
pub struct Ripple {
    config: RippleConfig,
    ripples: Vec<RippleRecord>,
    // (center, radius, strength) per live ripple, refilled every frame
    rings: Vec<(Vec2, f32, f32)>,
    canvas: Size,
    particle_count: usize,
    generation: u64,
    keep_alive: KeepAlive,
}

impl Ripple {
    /// Creates the effect from setup options.
    #[must_use]
    pub fn new(setup: EffectSetup<'_>) -> Self {
        Self::with_config(RippleConfig::from_options(setup.options), &setup.grid, setup.keep_alive)
    }

    /// Creates the effect with an explicit configuration.
    #[must_use]
    pub fn with_config(config: RippleConfig, grid: &Reinitialized, keep_alive: KeepAlive) -> Self {
        Self {
            config,
            ripples: Vec::new(),
            rings: Vec::new(),
            canvas: grid.canvas,
            particle_count: grid.particle_count,
            generation: grid.generation,
            keep_alive,
        }
    }

    /// Starts a ripple at `center` (the canvas centre if not finite).
    pub fn spawn(&mut self, center: Vec2, now: f64) {
        let center = if center.x.is_finite() && center.y.is_finite() {
            center
        } else {
            self.canvas.center()
        };
        self.ripples.push(RippleRecord {
            center,
            start_time: now,
            progress: 0.0,
        });
        self.keep_alive.request();
        tracing::trace!("ripple spawned at ({:.1}, {:.1})", center.x, center.y);
    }

    /// Live ripples.
    #[must_use]
    pub fn ripples(&self) -> &[RippleRecord] {
        &self.ripples
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &RippleConfig {
        &self.config
    }
}

impl Effect for Ripple {
    fn name(&self) -> &'static str {
        NAME
    }

    fn update_particles(
        &mut self,
        frame: &Frame,
        particles: &[Particle],
        out: &mut Vec<EffectContribution>,
    ) -> EffectOutput {
        self.canvas = frame.canvas;
        if self.generation != frame.generation || self.particle_count != particles.len() {
            self.generation = frame.generation;
            self.particle_count = particles.len();
        }

        let duration = self.config.duration;
        for ripple in &mut self.ripples {
            #[allow(clippy::cast_possible_truncation)]
            let t = ((frame.now - ripple.start_time) / duration) as f32;
            ripple.progress = t.max(0.0);
        }
        let before = self.ripples.len();
        self.ripples.retain(|r| r.progress <= 1.0);
        if self.ripples.is_empty() {
            if before > 0 {
                self.keep_alive.release();
                tracing::trace!("last ripple expired");
            }
            return EffectOutput::Skip;
        }
        self.keep_alive.request();

        if particles.is_empty() {
            return EffectOutput::Skip;
        }

        let cfg = self.config;
        let max_radius = cfg.max_radius(self.canvas);
        if !(max_radius > 0.0) {
            return EffectOutput::Skip;
        }
        let canvas = self.canvas;
        self.rings.clear();
        self.rings.extend(self.ripples.iter().map(|r| {
            (
                r.center,
                cfg.ring_radius(r.progress, canvas),
                RippleConfig::ring_strength(r.progress),
            )
        }));

        prepare_buffer(out, particles.len());
        for (particle, slot) in particles.iter().zip(out.iter_mut()) {
            let origin = particle.origin();
            let mut offset = Vec2::ZERO;
            let mut peak: f32 = 0.0;

            for &(center, radius, strength) in &self.rings {
                let delta = origin - center;
                let d_sq = delta.length_squared();
                if d_sq < MIN_DISTANCE_SQ {
                    continue;
                }
                let d = d_sq.sqrt();
                let n = (d - radius).abs() / max_radius;
                if n > cfg.thickness {
                    continue;
                }
                let s = (1.0 - n / cfg.thickness) * strength;
                offset += delta * (s * cfg.amplitude / d);
                peak = peak.max(s);
            }

            let touched = peak > 0.0;
            *slot = EffectContribution {
                dx: offset.x,
                dy: offset.y,
                opacity: (touched && cfg.affect_opacity)
                    .then(|| (frame.base_opacity * (1.0 + 0.5 * peak)).min(1.0)),
                size: (touched && cfg.affect_size).then_some(1.0 + peak),
            };
        }

        EffectOutput::Written
    }

    fn particles_reinitialized(&mut self, notice: &Reinitialized) {
        if !self.ripples.is_empty() {
            self.ripples.clear();
            self.keep_alive.release();
        }
        self.canvas = notice.canvas;
        self.particle_count = notice.particle_count;
        self.generation = notice.generation;
    }

    fn on_gesture(&mut self, gesture: &Gesture, now: f64) {
        match *gesture {
            Gesture::Click(at) | Gesture::Tap(at) => self.spawn(at, now),
            Gesture::PointerEnter | Gesture::TouchRelease => {}
        }
    }

    fn is_active(&self) -> bool {
        !self.ripples.is_empty()
    }

    fn state_len(&self) -> usize {
        self.particle_count
    }
}

/// Registry constructor.
#[must_use]
pub fn construct(setup: EffectSetup<'_>) -> Option<Box<dyn Effect>> {
    Some(Box::new(Ripple::new(setup)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshgrid_core::grid::GridDims;
    use meshgrid_core::interaction::InteractionSample;
    use meshgrid_core::AnimationScheduler;

    const CANVAS: Size = Size::new(400.0, 400.0);

    fn grid() -> Reinitialized {
        Reinitialized {
            generation: 1,
            dims: GridDims { cols: 2, rows: 1 },
            particle_count: 2,
            canvas: CANVAS,
        }
    }

    fn frame(now: f64) -> Frame {
        Frame {
            now,
            interaction: InteractionSample::IDLE,
            generation: 1,
            dims: GridDims { cols: 2, rows: 1 },
            canvas: CANVAS,
            base_opacity: 0.5,
        }
    }

    fn effect(config: RippleConfig) -> (Ripple, meshgrid_core::SharedScheduler) {
        let scheduler = AnimationScheduler::new().shared();
        let keep_alive = KeepAlive::register(&scheduler, NAME);
        (Ripple::with_config(config, &grid(), keep_alive), scheduler)
    }

    #[test]
    fn test_easing_endpoints() {
        let config = RippleConfig::default();
        assert_eq!(config.ring_radius(0.0, CANVAS), 0.0);
        assert!((config.ring_radius(1.0, CANVAS) - 600.0).abs() < 1e-3);
        assert!((config.ring_radius(0.5, CANVAS) - 450.0).abs() < 1e-3);
        assert_eq!(RippleConfig::ring_strength(0.0), 0.0);
        assert!(RippleConfig::ring_strength(1.0).abs() < 1e-6);
        assert!((RippleConfig::ring_strength(0.5) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_ring_pushes_outward() {
        let config = RippleConfig {
            max_radius_factor: 0.5,
            affect_opacity: true,
            affect_size: true,
            ..RippleConfig::default()
        };
        let (mut ripple, scheduler) = effect(config);
        // At t = 0.5 the ring radius is 150
        let particles = [Particle::at(350.0, 200.0, 0.5), Particle::at(200.0, 200.0, 0.5)];
        ripple.on_gesture(&Gesture::Click(Vec2::new(200.0, 200.0)), 0.0);
        assert_eq!(scheduler.lock().voter_count(), 1);

        let mut out = Vec::new();
        let result = ripple.update_particles(&frame(0.6), &particles, &mut out);
        assert_eq!(result, EffectOutput::Written);

        let c = out[0];
        assert!((c.dx - 15.0).abs() < 1e-3);
        assert!(c.dy.abs() < 1e-6);
        assert!((c.opacity.unwrap_or(0.0) - 0.75).abs() < 1e-4);
        assert!((c.size.unwrap_or(0.0) - 2.0).abs() < 1e-4);

        // Particle on the ripple centre is ignored
        assert_eq!(out[1], EffectContribution::NONE);
    }

    #[test]
    fn test_expired_ripples_contribute_nothing() {
        let (mut ripple, scheduler) = effect(RippleConfig::default());
        let particles = [Particle::at(10.0, 10.0, 0.5), Particle::at(20.0, 10.0, 0.5)];
        let mut out = Vec::new();

        ripple.spawn(Vec2::new(0.0, 0.0), 1.0);
        assert_eq!(ripple.update_particles(&frame(1.5), &particles, &mut out), EffectOutput::Written);
        assert_eq!(ripple.update_particles(&frame(2.3), &particles, &mut out), EffectOutput::Skip);
        assert!(ripple.ripples().is_empty());
        assert!(!ripple.is_active());
        assert_eq!(scheduler.lock().voter_count(), 0);
    }

    #[test]
    fn test_two_ripples_add() {
        let config = RippleConfig {
            max_radius_factor: 0.5,
            ..RippleConfig::default()
        };
        let particles = [Particle::at(200.0, 200.0, 0.5), Particle::at(0.0, 0.0, 0.5)];
        let mut single = Vec::new();
        let mut double = Vec::new();

        let (mut one, _s1) = effect(config);
        one.spawn(Vec2::new(50.0, 200.0), 0.0);
        one.update_particles(&frame(0.6), &particles, &mut single);

        let (mut two, _s2) = effect(config);
        two.spawn(Vec2::new(50.0, 200.0), 0.0);
        two.spawn(Vec2::new(50.0, 200.0), 0.0);
        two.update_particles(&frame(0.6), &particles, &mut double);

        assert!(single[0].dx > 0.0);
        assert!((double[0].dx - 2.0 * single[0].dx).abs() < 1e-4);
    }

    #[test]
    fn test_staggered_ripples_add_independently() {
        let config = RippleConfig {
            max_radius_factor: 0.5,
            thickness: 2.0,
            affect_size: true,
            ..RippleConfig::default()
        };
        let particles = [Particle::at(200.0, 200.0, 0.5), Particle::at(0.0, 0.0, 0.5)];
        let centre = Vec2::new(50.0, 200.0);
        let mut early = Vec::new();
        let mut late = Vec::new();
        let mut both = Vec::new();

        let (mut a, _s1) = effect(config);
        a.spawn(centre, 0.0);
        a.update_particles(&frame(0.6), &particles, &mut early);

        let (mut b, _s2) = effect(config);
        b.spawn(centre, 0.3);
        b.update_particles(&frame(0.6), &particles, &mut late);

        let (mut c, _s3) = effect(config);
        c.spawn(centre, 0.0);
        c.spawn(centre, 0.3);
        c.update_particles(&frame(0.6), &particles, &mut both);

        assert!(early[0].dx > 0.0);
        assert!(late[0].dx > 0.0);
        assert!((early[0].dx - late[0].dx).abs() > 1e-3);
        assert!((both[0].dx - (early[0].dx + late[0].dx)).abs() < 1e-4);
        assert!(both[0].dy.abs() < 1e-4);

        let (Some(s1), Some(s2), Some(s)) = (early[0].size, late[0].size, both[0].size) else {
            panic!("size not written");
        };
        assert!((s - s1.max(s2)).abs() < 1e-6);
    }

    #[test]
    fn test_non_finite_position_uses_centre() {
        let (mut ripple, _scheduler) = effect(RippleConfig::default());
        ripple.spawn(Vec2::new(f32::NAN, 3.0), 0.0);
        assert_eq!(ripple.ripples()[0].center, CANVAS.center());
    }

    #[test]
    fn test_affect_parsing() {
        let options = Options::new().with("ripple-affect", "size glow");
        let config = RippleConfig::from_options(&options);
        assert!(config.affect_size);
        assert!(!config.affect_opacity);
    }
}
