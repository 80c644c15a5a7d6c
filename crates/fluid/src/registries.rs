//! Built-in fluid and potion registries.

use std::sync::Arc;

use mdattrs_core::entry::{fluid_registry_id, potion_registry_id};
use mdattrs_core::{Identifier, IdentifierError, Registries, Registry, RegistryError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_NS: &str = mdattrs_core::registry::DEFAULT_NAMESPACE;

/// Path of the default ("nothing") entry in both built-in registries.
pub const EMPTY_PATH: &str = "empty";

/// A fluid type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fluid {
    /// Display name.
    pub name: String,
    /// Light level emitted by a source block, 0-15.
    pub luminance: u8,
}

impl Fluid {
    /// A fluid that emits no light.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            luminance: 0,
        }
    }

    /// Set the emitted light level.
    pub fn with_luminance(mut self, luminance: u8) -> Self {
        self.luminance = luminance.min(15);
        self
    }
}

/// A potion type, stored in tanks like any other fluid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Potion {
    /// Display name.
    pub name: String,
}

impl Potion {
    /// A potion named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Failure to assemble a registry set.
#[derive(Debug, Error)]
pub enum FluidError {
    /// An identifier literal was malformed.
    #[error("invalid identifier: {0}")]
    Identifier(#[from] IdentifierError),
    /// Two entries collided.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// The fluid and potion registries plus a root table holding both.
#[derive(Clone)]
pub struct FluidRegistries {
    fluids: Arc<Registry<Fluid>>,
    potions: Arc<Registry<Potion>>,
    root: Registries,
}

impl FluidRegistries {
    /// Wrap already populated registries.
    pub fn new(fluids: Registry<Fluid>, potions: Registry<Potion>) -> Result<Self, FluidError> {
        let fluids = Arc::new(fluids);
        let potions = Arc::new(potions);
        let mut root = Registries::new();
        root.insert(fluids.clone())?;
        root.insert(potions.clone())?;
        Ok(Self {
            fluids,
            potions,
            root,
        })
    }

    /// The fluid registry.
    pub fn fluids(&self) -> &Registry<Fluid> {
        &self.fluids
    }

    /// The potion registry.
    pub fn potions(&self) -> &Registry<Potion> {
        &self.potions
    }

    /// Root table used to decode persisted identities.
    pub fn root(&self) -> &Registries {
        &self.root
    }

    /// Mutable root table, for adding further registries.
    pub fn root_mut(&mut self) -> &mut Registries {
        &mut self.root
    }
}

impl std::fmt::Debug for FluidRegistries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FluidRegistries")
            .field("fluids", &self.fluids.len())
            .field("potions", &self.potions.len())
            .finish()
    }
}

/// Registries holding the stock content: `mdm:water` and `mdm:lava` fluids,
/// with `mdm:empty` as the default of both registries.
pub fn builtin_registries() -> Result<FluidRegistries, FluidError> {
    let empty = Identifier::new(DEFAULT_NS, EMPTY_PATH)?;

    let mut fluids = Registry::defaulted(fluid_registry_id(), empty.clone(), Fluid::new("empty"));
    fluids.register(Identifier::new(DEFAULT_NS, "water")?, Fluid::new("water"))?;
    fluids.register(
        Identifier::new(DEFAULT_NS, "lava")?,
        Fluid::new("lava").with_luminance(15),
    )?;

    let potions = Registry::defaulted(potion_registry_id(), empty, Potion::new("empty"));

    FluidRegistries::new(fluids, potions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdattrs_core::RegistryView;

    #[test]
    fn builtin_registries_hold_stock_content() {
        let registries = builtin_registries().unwrap();
        let water = Identifier::parse("mdm:water").unwrap();

        assert_eq!(registries.fluids().len(), 3);
        assert_eq!(registries.fluids().get(&water), Some(&Fluid::new("water")));
        assert_eq!(registries.potions().len(), 1);
        assert_eq!(
            registries.fluids().default_id(),
            Some(&Identifier::parse("mdm:empty").unwrap())
        );
        assert!(registries.root().get(&fluid_registry_id()).is_some());
        assert!(registries.root().get(&potion_registry_id()).is_some());
    }

    #[test]
    fn luminance_is_clamped() {
        assert_eq!(Fluid::new("glow").with_luminance(40).luminance, 15);
    }

    #[test]
    fn registries_reject_duplicate_roots() {
        let registries = builtin_registries().unwrap();
        let mut root = registries.root().clone();
        let again = Registry::<Fluid>::new(fluid_registry_id());
        assert!(root.insert(Arc::new(again)).is_err());
    }
}
