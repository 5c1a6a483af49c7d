//! # MESHGRID Effects
//!
//! Built-in effect plugins:
//! - [`repulsion`]: particles spring away from the pointer
//! - [`ripple`]: expanding rings from clicks and taps
//! - [`connect`]: cyclic row/column highlight sweeps
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │              builtin_registry()             │
//! ├──────────────┬──────────────┬──────────────┤
//! │  repulsion   │    ripple    │   connect    │
//! │ displacement │ displacement │   opacity    │
//! │              │ opacity/size │              │
//! └──────────────┴──────────────┴──────────────┘
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod connect;
pub mod easing;
pub mod repulsion;
pub mod ripple;

pub use connect::{Connect, ConnectConfig, FadeMode};
pub use easing::Easing;
pub use repulsion::{Repulsion, RepulsionConfig};
pub use ripple::{Ripple, RippleConfig};

use meshgrid_core::EffectRegistry;

/// Registry with every built-in effect.
#[must_use]
pub fn builtin_registry() -> EffectRegistry {
    EffectRegistry::new()
        .with(repulsion::NAME, repulsion::construct)
        .with(ripple::NAME, ripple::construct)
        .with(connect::NAME, connect::construct)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        let registry = builtin_registry();
        assert_eq!(registry.len(), 3);
        for name in ["repulsion", "ripple", "connect"] {
            assert!(registry.contains(name));
        }
    }
}
