//! One animated particle-grid host.
//!
//! A [`ParticleField`] ties the engine together for a single host element.
//! The host feeds it [`HostEvent`]s and calls [`ParticleField::frame`] from
//! its animation callback; the field decides whether the frame runs, updates
//! every installed effect, composites and draws.
//!
//! ```text
//!  host events ──▶ EventBus ─┐
//!                            ▼
//!  frame(now) ─▶ pump ─▶ scheduler.tick ─▶ interaction.commit
//!                               │ paused           │
//!                               ▼                  ▼
//!                         FrameOutcome::Paused   compose ─▶ render ─▶ Surface
//! ```

use std::sync::Arc;

use meshgrid_core::compositor::CompositeStats;
use meshgrid_core::grid::{GridConfig, GridDims, ParticleGrid, Reinitialized};
use meshgrid_core::interaction::{Gesture, InteractionSource};
use meshgrid_core::render::{render_particles, Color, Surface};
use meshgrid_core::{
    AnimationScheduler, Compositor, DeviceCaps, Effect, EffectRegistry, EffectSetup, Frame,
    KeepAlive, Options, Particle, SharedScheduler, Size,
};

use crate::events::{EventBus, EventSender, HostEvent};

/// Option key holding the space-separated effect list.
pub const EFFECT_LIST_KEY: &str = "grid-effect";

/// Label of the field's own keep-alive voter.
const CORE_VOTER: &str = "core";

/// What the host knows about its environment at setup time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostEnvironment {
    /// Initial container size.
    pub container: Size,
    /// Initial viewport width.
    pub viewport_width: f32,
    /// Input capabilities of the device.
    pub caps: DeviceCaps,
    /// Seed for effect randomness.
    pub seed: u64,
}

impl HostEnvironment {
    /// Desktop environment where the viewport is as wide as the container.
    #[must_use]
    pub fn desktop(width: f32, height: f32) -> Self {
        Self {
            container: Size::new(width, height),
            viewport_width: width,
            caps: DeviceCaps::DESKTOP,
            seed: 0,
        }
    }

    /// Returns the environment with a different viewport width.
    #[must_use]
    pub fn with_viewport_width(mut self, viewport_width: f32) -> Self {
        self.viewport_width = viewport_width;
        self
    }

    /// Returns the environment with different device capabilities.
    #[must_use]
    pub fn with_caps(mut self, caps: DeviceCaps) -> Self {
        self.caps = caps;
        self
    }

    /// Returns the environment with a different seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Result of one [`ParticleField::frame`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame ran and the surface was redrawn.
    Rendered(CompositeStats),
    /// The scheduler is paused; the surface was left untouched.
    Paused,
}

impl FrameOutcome {
    /// Returns true if the frame was drawn.
    #[must_use]
    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered(_))
    }
}

/// The particle grid, its effects and its frame loop for one host.
pub struct ParticleField {
    options: Options,
    grid: ParticleGrid,
    effects: Vec<Box<dyn Effect>>,
    compositor: Compositor,
    interaction: InteractionSource,
    scheduler: SharedScheduler,
    core: KeepAlive,
    bus: EventBus,
    color: Color,
    viewport_visible: bool,
    tab_visible: bool,
    frames: u64,
}

impl ParticleField {
    /// Sets up a field if `options` mark a grid host.
    #[must_use]
    pub fn for_host(options: Options, registry: &Arc<EffectRegistry>, env: HostEnvironment) -> Option<Self> {
        if !options.is_grid_host() {
            tracing::debug!("options do not mark a grid host, skipped");
            return None;
        }
        Some(Self::setup(options, registry, env))
    }

    /// Generates the grid and installs the configured effects.
    #[must_use]
    pub fn setup(options: Options, registry: &Arc<EffectRegistry>, env: HostEnvironment) -> Self {
        let config = GridConfig::from_options(&options);
        let base_opacity = config.base_opacity;
        let mut grid = ParticleGrid::new(config, env.container, env.viewport_width);
        let notice = grid.generate();

        let scheduler = AnimationScheduler::new().shared();
        let core = KeepAlive::register(&scheduler, CORE_VOTER);

        let effect_list = options.get(EFFECT_LIST_KEY).unwrap_or_default();
        let mut next_seed = env.seed;
        let effects = registry.instantiate(effect_list, &scheduler, |keep_alive| {
            let seed = next_seed;
            next_seed = next_seed.wrapping_add(1);
            EffectSetup {
                options: &options,
                particles: grid.particles(),
                grid: notice,
                base_opacity,
                caps: env.caps,
                keep_alive,
                seed,
            }
        });

        tracing::debug!(
            "particle field ready: {} particles, {} effects",
            notice.particle_count,
            effects.len()
        );

        Self {
            options,
            grid,
            effects,
            compositor: Compositor::new(),
            interaction: InteractionSource::new(env.container),
            scheduler,
            core,
            bus: EventBus::default(),
            color: Color::BLACK,
            viewport_visible: true,
            tab_visible: true,
            frames: 0,
        }
    }

    /// A producer handle for queuing host events from any thread.
    #[must_use]
    pub fn event_sender(&self) -> EventSender {
        self.bus.sender()
    }

    /// Applies every queued host event.
    pub fn pump_events(&mut self, now: f64) {
        let receiver = self.bus.receiver();
        for event in receiver.try_iter() {
            self.handle_event(event, now);
        }
    }

    /// Applies one host event immediately.
    pub fn handle_event(&mut self, event: HostEvent, now: f64) {
        match event {
            HostEvent::Resize {
                width,
                height,
                viewport_width,
            } => self.resize(Size::new(width, height), viewport_width),
            HostEvent::Bounds(rect) => self.interaction.set_bounds(rect),
            HostEvent::PointerEnter => {
                let gesture = self.interaction.pointer_enter();
                self.core.force_resume();
                self.dispatch(&gesture, now);
            }
            HostEvent::PointerMove(client) => {
                self.interaction.pointer_move(client);
                self.core.request();
            }
            HostEvent::PointerLeave => self.interaction.pointer_leave(),
            HostEvent::Click(client) => {
                let gesture = self.interaction.click(client);
                self.dispatch(&gesture, now);
            }
            HostEvent::TouchStart(client) => {
                self.interaction.touch_start(client);
                self.core.request();
            }
            HostEvent::TouchMove(client) => {
                self.interaction.touch_move(client);
            }
            HostEvent::TouchEnd => {
                let end = self.interaction.touch_end();
                if let Some(at) = end.tap {
                    self.dispatch(&Gesture::Tap(at), now);
                }
                self.dispatch(&Gesture::TouchRelease, now);
            }
            HostEvent::ViewportVisibility(visible) => {
                self.viewport_visible = visible;
                self.sync_visibility();
            }
            HostEvent::TabVisibility(visible) => {
                self.tab_visible = visible;
                self.sync_visibility();
            }
        }
    }

    /// Runs one frame at `now` seconds, drawing onto `surface`.
    pub fn frame<S>(&mut self, now: f64, surface: &mut S) -> FrameOutcome
    where
        S: Surface + ?Sized,
    {
        self.pump_events(now);

        if !self.scheduler.lock().tick(now) {
            return FrameOutcome::Paused;
        }

        let interaction = self.interaction.commit_frame();
        if interaction.interacting {
            self.core.request();
        } else {
            self.core.release();
        }

        let frame = Frame {
            now,
            interaction,
            generation: self.grid.generation(),
            dims: self.grid.dims(),
            canvas: self.grid.container(),
            base_opacity: self.grid.config().base_opacity,
        };
        let stats = self
            .compositor
            .compose(self.grid.particles_mut(), &mut self.effects, &frame);

        render_particles(surface, self.grid.particles(), self.grid.particle_size(), self.color);
        self.frames += 1;
        tracing::trace!(
            "frame {} at {:.3}s: {}/{} effects wrote",
            self.frames,
            now,
            stats.effects_written,
            stats.effects_run
        );

        FrameOutcome::Rendered(stats)
    }

    /// Changes the density and regenerates.
    pub fn set_density(&mut self, density: f32) {
        if !(density.is_finite() && density > 0.0) {
            tracing::warn!("ignoring invalid density {}", density);
            return;
        }
        self.grid.config_mut().density = density;
        self.regenerate();
    }

    /// Changes the padding and regenerates.
    pub fn set_padding(&mut self, padding: f32) {
        if !(padding.is_finite() && padding >= 0.0) {
            tracing::warn!("ignoring invalid padding {}", padding);
            return;
        }
        self.grid.config_mut().padding = padding.floor();
        self.regenerate();
    }

    /// Changes the particle size factor and regenerates.
    pub fn set_particle_size(&mut self, factor: f32) {
        if !(factor.is_finite() && factor > 0.0) {
            tracing::warn!("ignoring invalid particle size {}", factor);
            return;
        }
        self.grid.config_mut().particle_size_factor = factor;
        self.regenerate();
    }

    /// Sets the particle fill color.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
        self.core.force_resume();
    }

    /// Registers an observer for grid regenerations.
    pub fn subscribe(&mut self, observer: impl FnMut(&Reinitialized) + Send + 'static) {
        self.grid.subscribe(observer);
    }

    /// Current particles, as composited by the last frame.
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        self.grid.particles()
    }

    /// Lattice dimensions.
    #[must_use]
    pub fn dims(&self) -> GridDims {
        self.grid.dims()
    }

    /// Grid generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.grid.generation()
    }

    /// Configured density.
    #[must_use]
    pub fn density(&self) -> f32 {
        self.grid.config().density
    }

    /// Configured padding.
    #[must_use]
    pub fn padding(&self) -> f32 {
        self.grid.config().padding
    }

    /// Particle draw radius for the current viewport.
    #[must_use]
    pub fn particle_size(&self) -> f32 {
        self.grid.particle_size()
    }

    /// The field's own keep-alive handle.
    #[must_use]
    pub fn keep_alive(&self) -> &KeepAlive {
        &self.core
    }

    /// The shared scheduler, for registering extra voters.
    #[must_use]
    pub fn scheduler(&self) -> &SharedScheduler {
        &self.scheduler
    }

    /// Seconds between frames the host should aim for.
    #[must_use]
    pub fn frame_interval(&self) -> f64 {
        1.0 / f64::from(self.grid.config().frame_rate_hint.max(1.0))
    }

    /// Returns true if frames are currently being produced.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.scheduler.lock().is_running()
    }

    /// Installed effects, in list order.
    #[must_use]
    pub fn effects(&self) -> &[Box<dyn Effect>] {
        &self.effects
    }

    /// Options the field was set up with.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Frames rendered so far.
    #[must_use]
    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    fn resize(&mut self, container: Size, viewport_width: f32) {
        if container == self.grid.container() && viewport_width == self.grid.viewport_width() {
            return;
        }
        self.grid.resize(container, viewport_width);
        self.interaction.set_canvas(container);
        self.regenerate();
    }

    fn regenerate(&mut self) {
        let notice = self.grid.generate();
        for effect in &mut self.effects {
            effect.particles_reinitialized(&notice);
        }
        self.core.force_resume();
    }

    fn dispatch(&mut self, gesture: &Gesture, now: f64) {
        for effect in &mut self.effects {
            effect.on_gesture(gesture, now);
        }
    }

    fn sync_visibility(&mut self) {
        let visible = self.viewport_visible && self.tab_visible;
        self.scheduler.lock().set_visible(visible);
    }
}

impl std::fmt::Debug for ParticleField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.effects.iter().map(|e| e.name()).collect();
        f.debug_struct("ParticleField")
            .field("dims", &self.grid.dims())
            .field("generation", &self.grid.generation())
            .field("effects", &names)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}
