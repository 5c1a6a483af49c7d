//! # MESHGRID
//!
//! Animated particle-grid backgrounds. A host element configured with
//! `grid-*` options gets a lattice of diamonds that effect plugins push,
//! ripple and light up, and a frame loop that goes quiet when nothing moves.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     PARTICLE FIELD                        │
//! ├──────────────────────────────────────────────────────────┤
//! │  HostEvent ─▶ Interaction ─▶ Effects ─▶ Compositor       │
//! │                                  ▲           │            │
//! │  Arc<EffectRegistry> ────────────┘           ▼            │
//! │                         Scheduler ◀── voters   Surface    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ```no_run
//! use std::sync::Arc;
//! use meshgrid::{builtin_registry, DrawList, HostEnvironment, Options, ParticleField};
//!
//! let registry = Arc::new(builtin_registry());
//! let options = Options::new()
//!     .with("grid-bg", "true")
//!     .with("grid-effect", "repulsion ripple");
//!
//! if let Some(mut field) = ParticleField::for_host(options, &registry, HostEnvironment::desktop(800.0, 600.0)) {
//!     let mut surface = DrawList::new();
//!     field.frame(0.0, &mut surface);
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod events;
pub mod field;

pub use events::{EventBus, EventReceiver, EventSender, HostEvent};
pub use field::{FrameOutcome, HostEnvironment, ParticleField};

pub use meshgrid_core::{
    Color, DeviceCaps, DrawCommand, DrawList, Effect, EffectRegistry, KeepAlive, Options, Particle,
    Rect, Size, Surface, Vec2,
};
pub use meshgrid_effects::builtin_registry;
