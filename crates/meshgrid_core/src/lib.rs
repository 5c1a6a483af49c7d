//! # MESHGRID Core
//!
//! The particle engine behind an animated dot-grid background:
//! - Responsive lattice generation with synchronous reinitialize notices
//! - Effect plugins that contribute per-particle displacement, opacity and size
//! - Order-independent composition of those contributions
//! - A keep-alive scheduler that stops the frame loop when nothing moves
//!
//! ## Frame Pipeline
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        ONE FRAME                              │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Scheduler.tick ─▶ Interaction.commit ─▶ Effects ─▶ Compose  │
//! │       │ false                                 │        │     │
//! │       ▼                                       ▼        ▼     │
//! │   skip frame                          pooled buffers  Render │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Concrete effects live in `meshgrid_effects`; the host-facing instance
//! lives in `meshgrid`.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod compositor;
pub mod effect;
pub mod error;
pub mod grid;
pub mod interaction;
pub mod math;
pub mod options;
pub mod particle;
pub mod registry;
pub mod render;
pub mod scheduler;

pub use compositor::{CompositeStats, Compositor};
pub use effect::{DeviceCaps, Effect, EffectContribution, EffectOutput, EffectSetup, Frame};
pub use error::{ConfigError, ConfigResult};
pub use grid::{Breakpoint, GridConfig, GridDims, ParticleGrid, Reinitialized};
pub use interaction::{Gesture, InteractionSample, InteractionSource, TouchIntent};
pub use math::{Rect, Size, Vec2};
pub use options::Options;
pub use particle::Particle;
pub use registry::{EffectConstructor, EffectRegistry};
pub use render::{render_particles, Color, DiamondVertex, DrawCommand, DrawList, Surface};
pub use scheduler::{AnimationScheduler, KeepAlive, SharedScheduler, VoterId};
