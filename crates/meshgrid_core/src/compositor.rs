//! Per-frame effect composition.
//!
//! ```text
//! reset particles ──▶ effect[0].update(buf[0]) ─┐
//!                     effect[1].update(buf[1]) ─┼─▶ merge ──▶ particles
//!                     effect[n].update(buf[n]) ─┘
//!
//! merge:  x, y    = origin + Σ dx, Σ dy
//!         opacity = max(base, opacity_0 .. opacity_n)
//!         size    = max(1,    size_0    .. size_n)
//! ```
//!
//! Sum and max are both commutative, so effect order never changes the
//! output.

use crate::effect::{Effect, EffectContribution, EffectOutput, Frame};
use crate::particle::Particle;

/// Statistics from the last composition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositeStats {
    /// Effects that ran.
    pub effects_run: usize,
    /// Effects that wrote contributions.
    pub effects_written: usize,
    /// Particles composited.
    pub particles: usize,
}

/// Owns one pooled contribution buffer per effect.
#[derive(Debug, Default)]
pub struct Compositor {
    buffers: Vec<Vec<EffectContribution>>,
    written: Vec<bool>,
    stats: CompositeStats,
}

impl Compositor {
    /// Creates a compositor with no buffers; they grow on first use.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every effect and merges their contributions into `particles`.
    pub fn compose(
        &mut self,
        particles: &mut [Particle],
        effects: &mut [Box<dyn Effect>],
        frame: &Frame,
    ) -> CompositeStats {
        for particle in particles.iter_mut() {
            particle.reset(frame.base_opacity);
        }

        if self.buffers.len() != effects.len() {
            self.buffers.resize_with(effects.len(), Vec::new);
            self.written.resize(effects.len(), false);
        }

        let mut effects_written = 0;
        for (i, effect) in effects.iter_mut().enumerate() {
            let buffer = &mut self.buffers[i];
            let wrote = match effect.update_particles(frame, particles, buffer) {
                EffectOutput::Written if buffer.len() == particles.len() => true,
                EffectOutput::Written => {
                    tracing::warn!(
                        "effect {} wrote {} contributions for {} particles, ignored",
                        effect.name(),
                        buffer.len(),
                        particles.len()
                    );
                    false
                }
                EffectOutput::Skip => false,
            };
            self.written[i] = wrote;
            effects_written += usize::from(wrote);
        }

        if effects_written > 0 {
            let active = self
                .buffers
                .iter()
                .zip(&self.written)
                .filter_map(|(buffer, &wrote)| wrote.then_some(buffer.as_slice()));
            merge(particles, active, frame.base_opacity);
        }

        self.stats = CompositeStats {
            effects_run: effects.len(),
            effects_written,
            particles: particles.len(),
        };
        self.stats
    }

    /// Statistics from the last composition.
    #[must_use]
    pub fn stats(&self) -> CompositeStats {
        self.stats
    }
}

/// Merges index-aligned contribution sets onto reset particles.
///
/// `contributions` is walked once per particle, so it must be cheap to clone.
pub fn merge<'a, I>(particles: &mut [Particle], contributions: I, base_opacity: f32)
where
    I: IntoIterator<Item = &'a [EffectContribution]>,
    I::IntoIter: Clone,
{
    let contributions = contributions.into_iter();
    for (i, particle) in particles.iter_mut().enumerate() {
        let mut dx = 0.0;
        let mut dy = 0.0;
        let mut opacity = base_opacity;
        let mut size: f32 = 1.0;

        for set in contributions.clone() {
            let c = &set[i];
            dx += c.dx;
            dy += c.dy;
            if let Some(o) = c.opacity {
                opacity = opacity.max(o);
            }
            if let Some(s) = c.size {
                size = size.max(s);
            }
        }

        particle.x += dx;
        particle.y += dy;
        particle.opacity = opacity;
        particle.size = size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GridDims, Reinitialized};
    use crate::interaction::InteractionSample;
    use crate::math::Size;

    struct Fixed {
        at: usize,
        contribution: EffectContribution,
    }

    impl Effect for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn update_particles(
            &mut self,
            _frame: &Frame,
            particles: &[Particle],
            out: &mut Vec<EffectContribution>,
        ) -> EffectOutput {
            crate::effect::prepare_buffer(out, particles.len());
            out.fill(EffectContribution::NONE);
            out[self.at] = self.contribution;
            EffectOutput::Written
        }
        fn particles_reinitialized(&mut self, _notice: &Reinitialized) {}
        fn state_len(&self) -> usize {
            0
        }
    }

    struct Silent;

    impl Effect for Silent {
        fn name(&self) -> &'static str {
            "silent"
        }
        fn update_particles(
            &mut self,
            _frame: &Frame,
            _particles: &[Particle],
            _out: &mut Vec<EffectContribution>,
        ) -> EffectOutput {
            EffectOutput::Skip
        }
        fn particles_reinitialized(&mut self, _notice: &Reinitialized) {}
        fn state_len(&self) -> usize {
            0
        }
    }

    fn frame(base_opacity: f32) -> Frame {
        Frame {
            now: 0.0,
            interaction: InteractionSample::IDLE,
            generation: 1,
            dims: GridDims { cols: 2, rows: 2 },
            canvas: Size::new(10.0, 10.0),
            base_opacity,
        }
    }

    fn particles() -> Vec<Particle> {
        (0..4).map(|i| Particle::at(i as f32, 0.0, 0.2)).collect()
    }

    fn pair(k: usize) -> Vec<Box<dyn Effect>> {
        vec![
            Box::new(Fixed {
                at: k,
                contribution: EffectContribution {
                    dx: 1.0,
                    dy: 0.0,
                    opacity: Some(0.3),
                    size: Some(1.5),
                },
            }),
            Box::new(Fixed {
                at: k,
                contribution: EffectContribution {
                    dx: 0.0,
                    dy: 1.0,
                    opacity: Some(0.7),
                    size: Some(1.2),
                },
            }),
        ]
    }

    #[test]
    fn test_sum_displacement_max_opacity() {
        let mut particles = particles();
        let mut effects = pair(2);
        let mut compositor = Compositor::new();

        let stats = compositor.compose(&mut particles, &mut effects, &frame(0.2));
        assert_eq!(stats.effects_written, 2);

        let p = particles[2];
        assert_eq!((p.x - p.orig_x, p.y - p.orig_y), (1.0, 1.0));
        assert_eq!(p.opacity, 0.7);
        assert_eq!(p.size, 1.5);

        // Untouched particles sit at base
        assert_eq!(particles[0].opacity, 0.2);
        assert_eq!(particles[0].size, 1.0);
    }

    #[test]
    fn test_order_independent() {
        let mut forward = particles();
        let mut reverse = particles();
        let mut effects = pair(1);
        let mut compositor = Compositor::new();
        compositor.compose(&mut forward, &mut effects, &frame(0.2));

        effects.reverse();
        let mut compositor = Compositor::new();
        compositor.compose(&mut reverse, &mut effects, &frame(0.2));

        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_skipped_effects_and_reset() {
        let mut particles = particles();
        particles[0].x = 99.0;
        let mut effects: Vec<Box<dyn Effect>> = vec![Box::new(Silent)];
        let mut compositor = Compositor::new();

        let stats = compositor.compose(&mut particles, &mut effects, &frame(0.5));
        assert_eq!(stats.effects_written, 0);
        assert_eq!(particles[0].x, 0.0);
        assert!(particles.iter().all(|p| p.opacity == 0.5));
    }

    #[test]
    fn test_merge_only_walks_given_sets() {
        let mut pushed = particles();
        let push = [EffectContribution {
            dx: 2.0,
            dy: -1.0,
            opacity: None,
            size: Some(3.0),
        }; 4];
        let fade = [EffectContribution {
            dx: 0.5,
            dy: 0.0,
            opacity: Some(0.9),
            size: None,
        }; 4];

        merge(&mut pushed, [push.as_slice(), fade.as_slice()], 0.2);
        for p in &pushed {
            assert_eq!((p.x - p.orig_x, p.y - p.orig_y), (2.5, -1.0));
            assert_eq!(p.opacity, 0.9);
            assert_eq!(p.size, 3.0);
        }

        let mut untouched = particles();
        merge(&mut untouched, std::iter::empty(), 0.4);
        assert!(untouched.iter().all(|p| p.opacity == 0.4 && p.size == 1.0));
    }

    #[test]
    fn test_buffers_are_reused() {
        let mut particles = particles();
        let mut effects = pair(0);
        let mut compositor = Compositor::new();

        compositor.compose(&mut particles, &mut effects, &frame(0.2));
        let ptr = compositor.buffers[0].as_ptr();
        compositor.compose(&mut particles, &mut effects, &frame(0.2));
        assert_eq!(compositor.buffers[0].as_ptr(), ptr);
    }
}
