#![warn(missing_docs)]
//! Fluid tanks, fluid identities, and the built-in fluid and potion registries.

pub mod amount;
pub mod key;
pub mod registries;
pub mod tank;

use mdattrs_core::{CombinedFixedView, ResourceFilter, ResourceKind};

pub use amount::{FluidAmount, FluidVolume};
pub use key::{FluidEntry, FluidKey, WIRE_TAG_FLOATING};
pub use registries::{builtin_registries, Fluid, FluidError, FluidRegistries, Potion};
pub use tank::SimpleFixedFluidInv;

/// Resource family for fluid containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FluidKind {}

impl ResourceKind for FluidKind {
    type Resource = Option<FluidVolume>;
    type Key = FluidKey;
    type Amount = FluidAmount;
}

/// Filter over fluid identities.
pub type FluidFilter = ResourceFilter<FluidKey>;

/// Several fluid views presented as one.
pub type CombinedFixedFluidInvView = CombinedFixedView<FluidKind>;
