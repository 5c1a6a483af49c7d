//! Effect plugin interface.
//!
//! An effect reads the particle list and writes one [`EffectContribution`]
//! per particle into a buffer the compositor lends it. The buffer is pooled:
//! it keeps its allocation across frames and is only resized when the
//! particle count changes.
//!
//! Effects never write to [`Particle`]s. Per-particle state (velocities,
//! animation timings) lives in the effect's own index-aligned storage and is
//! rebuilt from the [`Reinitialized`] notice.

use crate::grid::{GridDims, Reinitialized};
use crate::interaction::{Gesture, InteractionSample};
use crate::math::Size;
use crate::options::Options;
use crate::particle::Particle;
use crate::scheduler::KeepAlive;

/// Device capabilities an effect may use to decline installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCaps {
    /// A hover-capable pointer (mouse, trackpad) is present.
    pub hover: bool,
    /// A touch screen is present.
    pub touch: bool,
}

impl DeviceCaps {
    /// Desktop: pointer, no touch.
    pub const DESKTOP: Self = Self {
        hover: true,
        touch: false,
    };
    /// Phone or tablet: touch only.
    pub const TOUCH_ONLY: Self = Self {
        hover: false,
        touch: true,
    };

    /// Returns true if the device has touch but no hover pointer.
    #[must_use]
    pub const fn is_touch_only(self) -> bool {
        self.touch && !self.hover
    }
}

impl Default for DeviceCaps {
    fn default() -> Self {
        Self::DESKTOP
    }
}

/// One particle's contribution for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EffectContribution {
    /// Horizontal displacement in pixels.
    pub dx: f32,
    /// Vertical displacement in pixels.
    pub dy: f32,
    /// Requested opacity, if the effect modulates opacity.
    pub opacity: Option<f32>,
    /// Requested size multiplier, if the effect modulates size.
    pub size: Option<f32>,
}

impl EffectContribution {
    /// No displacement, no opacity or size request.
    pub const NONE: Self = Self {
        dx: 0.0,
        dy: 0.0,
        opacity: None,
        size: None,
    };

    /// Pure displacement.
    #[must_use]
    pub const fn displace(dx: f32, dy: f32) -> Self {
        Self {
            dx,
            dy,
            opacity: None,
            size: None,
        }
    }
}

/// Resizes a pooled buffer to `len` only if needed.
///
/// Existing entries are left as they are; callers overwrite every slot.
pub fn prepare_buffer(buffer: &mut Vec<EffectContribution>, len: usize) {
    if buffer.len() != len {
        buffer.resize(len, EffectContribution::NONE);
    }
}

/// What an effect produced for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectOutput {
    /// Nothing this frame; the compositor ignores the buffer.
    Skip,
    /// The buffer holds one contribution per particle.
    Written,
}

/// Per-frame context handed to every effect.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    /// Monotonic time in seconds.
    pub now: f64,
    /// Interaction point committed for this frame.
    pub interaction: InteractionSample,
    /// Generation of the particle list being updated.
    pub generation: u64,
    /// Lattice dimensions of the particle list.
    pub dims: GridDims,
    /// Canvas size.
    pub canvas: Size,
    /// Base particle opacity.
    pub base_opacity: f32,
}

/// Everything an effect constructor may read.
pub struct EffectSetup<'a> {
    /// The host's configuration.
    pub options: &'a Options,
    /// The particle list at setup time.
    pub particles: &'a [Particle],
    /// The grid state at setup time.
    pub grid: Reinitialized,
    /// Base particle opacity.
    pub base_opacity: f32,
    /// Device capabilities.
    pub caps: DeviceCaps,
    /// A freshly registered keep-alive voter for this effect.
    pub keep_alive: KeepAlive,
    /// Seed for any randomness the effect needs.
    pub seed: u64,
}

/// A visual effect plugin.
pub trait Effect: Send {
    /// Registry name of the effect.
    fn name(&self) -> &'static str;

    /// Writes this frame's contributions into `out`.
    ///
    /// `out` must end up with exactly `particles.len()` entries when
    /// [`EffectOutput::Written`] is returned; use [`prepare_buffer`] and
    /// overwrite in place.
    fn update_particles(
        &mut self,
        frame: &Frame,
        particles: &[Particle],
        out: &mut Vec<EffectContribution>,
    ) -> EffectOutput;

    /// Rebuilds per-particle state after the grid regenerated.
    fn particles_reinitialized(&mut self, notice: &Reinitialized);

    /// Consumes a discrete interaction.
    fn on_gesture(&mut self, _gesture: &Gesture, _now: f64) {}

    /// Diagnostics: whether the effect is currently animating.
    fn is_active(&self) -> bool {
        true
    }

    /// Particle count the effect's per-index state is aligned to.
    fn state_len(&self) -> usize;
}
