//! Effect registry.
//!
//! Maps effect-type names to constructors. A registry is built once at
//! startup, wrapped in an `Arc` and handed to every grid instance; it is
//! never mutated afterwards.

use std::collections::HashMap;

use crate::effect::{Effect, EffectSetup};
use crate::scheduler::{KeepAlive, SharedScheduler};

/// Builds an effect, or returns `None` to decline installation.
pub type EffectConstructor = fn(EffectSetup<'_>) -> Option<Box<dyn Effect>>;

/// Name-to-constructor table.
#[derive(Default, Clone)]
pub struct EffectRegistry {
    constructors: HashMap<&'static str, EffectConstructor>,
}

impl EffectRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a constructor.
    pub fn register(&mut self, name: &'static str, constructor: EffectConstructor) {
        if self.constructors.insert(name, constructor).is_some() {
            tracing::debug!("effect constructor replaced: {}", name);
        }
    }

    /// Builder-style [`Self::register`].
    #[must_use]
    pub fn with(mut self, name: &'static str, constructor: EffectConstructor) -> Self {
        self.register(name, constructor);
        self
    }

    /// Looks up a constructor.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<EffectConstructor> {
        self.constructors.get(name).copied()
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Number of registered effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Instantiates the effects named in a space-separated list, in order.
    ///
    /// Unknown names and declining constructors are skipped. `make_setup`
    /// receives each effect's own keep-alive voter.
    pub fn instantiate<'a>(
        &self,
        effect_list: &str,
        scheduler: &SharedScheduler,
        mut make_setup: impl FnMut(KeepAlive) -> EffectSetup<'a>,
    ) -> Vec<Box<dyn Effect>> {
        let mut effects = Vec::new();
        for name in effect_list.split_whitespace() {
            let Some((&label, &constructor)) = self.constructors.get_key_value(name) else {
                tracing::debug!("unknown effect type skipped: {}", name);
                continue;
            };
            let keep_alive = KeepAlive::register(scheduler, label);
            match constructor(make_setup(keep_alive)) {
                Some(effect) => {
                    tracing::debug!("effect installed: {}", name);
                    effects.push(effect);
                }
                None => tracing::debug!("effect declined to install: {}", name),
            }
        }
        effects
    }
}

impl std::fmt::Debug for EffectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.constructors.keys().collect();
        names.sort();
        f.debug_struct("EffectRegistry").field("effects", &names).finish()
    }
}
