//! Repulsion effect.
//!
//! Particles are pushed away from the interaction point and spring back to
//! their origin. The displacement of a particle *is* its velocity: every
//! frame the velocity gets the push, a restoring pull towards the origin and
//! friction, and the result is emitted as `(dx, dy)`.
//!
//! ```text
//!   force(d) = min(max_force, strength * (1 - (d / radius)^2))   0.1 < d < radius
//!   v       += dir * force(d)
//!   v       += -v * return_speed
//!   v       *= friction
//! ```

use meshgrid_core::effect::{prepare_buffer, DeviceCaps};
use meshgrid_core::interaction::Gesture;
use meshgrid_core::options::Options;
use meshgrid_core::{
    Effect, EffectContribution, EffectOutput, EffectSetup, Frame, KeepAlive, Particle,
    Reinitialized, Vec2,
};

/// Registry name.
pub const NAME: &str = "repulsion";

/// Consecutive still frames before the keep-alive vote is released.
pub const REST_FRAMES: u32 = 8;

/// Distance below which no force is applied.
const MIN_DISTANCE: f32 = 0.1;

/// Repulsion tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepulsionConfig {
    /// Influence radius in pixels.
    pub radius: f32,
    /// Force scale.
    pub strength: f32,
    /// Per-frame force cap.
    pub max_force: f32,
    /// Velocity multiplier per frame.
    pub friction: f32,
    /// Fraction of the offset pulled back per frame.
    pub return_speed: f32,
    /// Speed under which a particle counts as still.
    pub velocity_threshold: f32,
}

impl RepulsionConfig {
    /// Reads `repulsion-*` overrides.
    #[must_use]
    pub fn from_options(options: &Options) -> Self {
        let d = Self::default();
        Self {
            radius: options.number_where("repulsion-radius", d.radius, |v| v > 0.0),
            strength: options.number_where("repulsion-strength", d.strength, |v| v >= 0.0),
            max_force: options.number_where("repulsion-max-force", d.max_force, |v| v >= 0.0),
            friction: options.number_where("repulsion-friction", d.friction, |v| {
                (0.0..=1.0).contains(&v)
            }),
            return_speed: options.number_where("repulsion-return-speed", d.return_speed, |v| {
                (0.0..=1.0).contains(&v)
            }),
            velocity_threshold: options.number_where(
                "repulsion-velocity-threshold",
                d.velocity_threshold,
                |v| v >= 0.0,
            ),
        }
    }

    /// Force magnitude at distance `d` from the interaction point.
    #[must_use]
    pub fn force_at(&self, d: f32) -> f32 {
        if d <= MIN_DISTANCE || d >= self.radius {
            return 0.0;
        }
        let n = d / self.radius;
        (self.strength * (1.0 - n * n)).min(self.max_force)
    }
}

impl Default for RepulsionConfig {
    fn default() -> Self {
        Self {
            radius: 150.0,
            strength: 2.0,
            max_force: 2.0,
            friction: 0.85,
            return_speed: 0.15,
            velocity_threshold: 0.01,
        }
    }
}

/// Pointer repulsion with spring return.
#[derive(Debug)]
pub struct Repulsion {
    config: RepulsionConfig,
    velocities: Vec<Vec2>,
    generation: u64,
    still_frames: u32,
    awake: bool,
    keep_alive: KeepAlive,
}

impl Repulsion {
    /// Creates the effect; `None` on touch-only devices.
    #[must_use]
    pub fn new(setup: EffectSetup<'_>) -> Option<Self> {
        if setup.caps.is_touch_only() {
            return None;
        }
        Some(Self::with_config(
            RepulsionConfig::from_options(setup.options),
            &setup.grid,
            setup.keep_alive,
        ))
    }

    /// Creates the effect with an explicit configuration.
    #[must_use]
    pub fn with_config(config: RepulsionConfig, grid: &Reinitialized, keep_alive: KeepAlive) -> Self {
        Self {
            config,
            velocities: vec![Vec2::ZERO; grid.particle_count],
            generation: grid.generation,
            still_frames: 0,
            awake: false,
            keep_alive,
        }
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &RepulsionConfig {
        &self.config
    }

    /// Per-particle velocity (and displacement).
    #[must_use]
    pub fn velocities(&self) -> &[Vec2] {
        &self.velocities
    }

    fn resync(&mut self, len: usize, generation: u64) {
        self.velocities.clear();
        self.velocities.resize(len, Vec2::ZERO);
        self.generation = generation;
        self.still_frames = 0;
    }

    fn wake(&mut self) {
        self.awake = true;
        self.still_frames = 0;
        self.keep_alive.request();
    }

    fn settle(&mut self) {
        self.velocities.fill(Vec2::ZERO);
        self.awake = false;
        self.still_frames = 0;
        self.keep_alive.release();
        tracing::trace!("repulsion at rest");
    }
}

impl Effect for Repulsion {
    fn name(&self) -> &'static str {
        NAME
    }

    fn update_particles(
        &mut self,
        frame: &Frame,
        particles: &[Particle],
        out: &mut Vec<EffectContribution>,
    ) -> EffectOutput {
        if particles.is_empty() {
            return EffectOutput::Skip;
        }
        if self.velocities.len() != particles.len() || self.generation != frame.generation {
            self.resync(particles.len(), frame.generation);
        }

        let point = frame.interaction.point();
        if point.is_some() {
            self.wake();
        } else if !self.awake {
            return EffectOutput::Skip;
        }

        let cfg = self.config;
        prepare_buffer(out, particles.len());
        let mut max_speed_sq: f32 = 0.0;

        for ((particle, velocity), slot) in particles.iter().zip(&mut self.velocities).zip(out.iter_mut()) {
            let origin = particle.origin();
            let current = origin + *velocity;

            if let Some(point) = point {
                let away = current - point;
                let d = away.length();
                let force = cfg.force_at(d);
                if force > 0.0 {
                    *velocity += away * (force / d);
                }
            }

            *velocity += *velocity * -cfg.return_speed;
            *velocity = *velocity * cfg.friction;

            max_speed_sq = max_speed_sq.max(velocity.length_squared());
            *slot = EffectContribution::displace(velocity.x, velocity.y);
        }

        if point.is_none() {
            if max_speed_sq <= cfg.velocity_threshold * cfg.velocity_threshold {
                self.still_frames += 1;
                if self.still_frames >= REST_FRAMES {
                    self.settle();
                }
            } else {
                self.still_frames = 0;
                self.keep_alive.request();
            }
        }

        EffectOutput::Written
    }

    fn particles_reinitialized(&mut self, notice: &Reinitialized) {
        self.resync(notice.particle_count, notice.generation);
    }

    fn on_gesture(&mut self, gesture: &Gesture, _now: f64) {
        match gesture {
            Gesture::PointerEnter => self.keep_alive.force_resume(),
            Gesture::TouchRelease => {
                for velocity in &mut self.velocities {
                    *velocity = *velocity * 0.5;
                }
            }
            Gesture::Click(_) | Gesture::Tap(_) => {}
        }
    }

    fn is_active(&self) -> bool {
        self.awake
    }

    fn state_len(&self) -> usize {
        self.velocities.len()
    }
}

/// Registry constructor.
#[must_use]
pub fn construct(setup: EffectSetup<'_>) -> Option<Box<dyn Effect>> {
    let caps: DeviceCaps = setup.caps;
    match Repulsion::new(setup) {
        Some(effect) => Some(Box::new(effect)),
        None => {
            tracing::debug!("repulsion declined: touch-only device ({:?})", caps);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshgrid_core::grid::GridDims;
    use meshgrid_core::interaction::InteractionSample;
    use meshgrid_core::{AnimationScheduler, Size};

    fn grid(count: usize) -> Reinitialized {
        Reinitialized {
            generation: 1,
            dims: GridDims { cols: count, rows: 1 },
            particle_count: count,
            canvas: Size::new(400.0, 400.0),
        }
    }

    fn frame(interaction: InteractionSample) -> Frame {
        Frame {
            now: 0.0,
            interaction,
            generation: 1,
            dims: GridDims { cols: 3, rows: 1 },
            canvas: Size::new(400.0, 400.0),
            base_opacity: 1.0,
        }
    }

    fn pointer(x: f32, y: f32) -> InteractionSample {
        InteractionSample {
            position: Vec2::new(x, y),
            interacting: true,
        }
    }

    fn particles() -> Vec<Particle> {
        vec![
            Particle::at(100.0, 100.0, 1.0),
            Particle::at(150.0, 100.0, 1.0),
            Particle::at(350.0, 100.0, 1.0),
        ]
    }

    #[test]
    fn test_force_vanishes_at_radius() {
        let config = RepulsionConfig::default();
        assert_eq!(config.force_at(150.0), 0.0);
        assert_eq!(config.force_at(200.0), 0.0);
        assert_eq!(config.force_at(0.05), 0.0);
        assert!(config.force_at(149.0) > 0.0);
        assert!(config.force_at(149.0) < 0.05);
        // Below the cap with matching strength
        assert!(config.force_at(1.0) < config.max_force);
        assert!((config.force_at(1.0) - 2.0 * (1.0 - (1.0_f32 / 150.0).powi(2))).abs() < 1e-6);
    }

    #[test]
    fn test_force_capped_by_max_force() {
        let config = RepulsionConfig {
            strength: 4.0,
            ..RepulsionConfig::default()
        };
        assert_eq!(config.force_at(1.0), config.max_force);
        assert_eq!(config.force_at(75.0), 2.0_f32.min(4.0 * 0.75));
        // Outer band falls below the cap
        assert!((config.force_at(120.0) - 4.0 * (1.0 - 0.64)).abs() < 1e-5);
    }

    #[test]
    fn test_pushes_away_and_returns_monotonically() {
        let scheduler = AnimationScheduler::new().shared();
        let keep_alive = KeepAlive::register(&scheduler, NAME);
        let mut effect = Repulsion::with_config(RepulsionConfig::default(), &grid(3), keep_alive);
        let particles = particles();
        let mut out = Vec::new();

        let result = effect.update_particles(&frame(pointer(120.0, 100.0)), &particles, &mut out);
        assert_eq!(result, EffectOutput::Written);
        assert!(out[0].dx < 0.0);
        assert!(out[1].dx > 0.0);
        // Outside the radius
        assert_eq!(out[2].dx, 0.0);
        assert!(effect.is_active());
        assert_eq!(scheduler.lock().voter_count(), 1);

        let mut last = out[0].dx.hypot(out[0].dy);
        for _ in 0..20 {
            effect.update_particles(&frame(InteractionSample::IDLE), &particles, &mut out);
            let d = out[0].dx.hypot(out[0].dy);
            if last == 0.0 {
                break;
            }
            assert!(d < last);
            last = d;
        }
    }

    #[test]
    fn test_releases_vote_after_rest_frames() {
        let scheduler = AnimationScheduler::new().shared();
        let keep_alive = KeepAlive::register(&scheduler, NAME);
        let mut effect = Repulsion::with_config(RepulsionConfig::default(), &grid(3), keep_alive);
        let particles = particles();
        let mut out = Vec::new();

        effect.update_particles(&frame(pointer(120.0, 100.0)), &particles, &mut out);

        let mut frames = 0;
        while effect.is_active() {
            effect.update_particles(&frame(InteractionSample::IDLE), &particles, &mut out);
            frames += 1;
            assert!(frames < 200);
        }
        assert!(frames >= REST_FRAMES as usize);
        assert_eq!(scheduler.lock().voter_count(), 0);
        assert!(effect.velocities().iter().all(|v| *v == Vec2::ZERO));

        // Resting: nothing to contribute
        let result = effect.update_particles(&frame(InteractionSample::IDLE), &particles, &mut out);
        assert_eq!(result, EffectOutput::Skip);
    }

    #[test]
    fn test_touch_release_halves_velocity() {
        let scheduler = AnimationScheduler::new().shared();
        let keep_alive = KeepAlive::register(&scheduler, NAME);
        let mut effect = Repulsion::with_config(RepulsionConfig::default(), &grid(3), keep_alive);
        let mut out = Vec::new();
        effect.update_particles(&frame(pointer(120.0, 100.0)), &particles(), &mut out);

        let before = effect.velocities()[0];
        effect.on_gesture(&Gesture::TouchRelease, 0.0);
        assert_eq!(effect.velocities()[0], before * 0.5);
    }

    #[test]
    fn test_resyncs_on_length_mismatch() {
        let scheduler = AnimationScheduler::new().shared();
        let keep_alive = KeepAlive::register(&scheduler, NAME);
        let mut effect = Repulsion::with_config(RepulsionConfig::default(), &grid(1), keep_alive);
        let mut out = Vec::new();

        effect.update_particles(&frame(pointer(120.0, 100.0)), &particles(), &mut out);
        assert_eq!(effect.state_len(), 3);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_declines_on_touch_only() {
        let scheduler = AnimationScheduler::new().shared();
        let options = Options::new();
        let setup = |caps| EffectSetup {
            options: &options,
            particles: &[],
            grid: grid(0),
            base_opacity: 1.0,
            caps,
            keep_alive: KeepAlive::register(&scheduler, NAME),
            seed: 0,
        };
        assert!(construct(setup(DeviceCaps::TOUCH_ONLY)).is_none());
        assert!(construct(setup(DeviceCaps::DESKTOP)).is_some());
    }

    #[test]
    fn test_malformed_options_fall_back() {
        let options = Options::new()
            .with("repulsion-radius", "wide")
            .with("repulsion-friction", "0.5");
        let config = RepulsionConfig::from_options(&options);
        assert_eq!(config.radius, 150.0);
        assert_eq!(config.friction, 0.5);
    }
}
