#![warn(missing_docs)]
//! Item containers built on the fixed-slot view contract.

pub mod extractable;
pub mod inventory;
pub mod stack;

use mdattrs_core::{CombinedFixedView, ResourceFilter, ResourceKind};

pub use extractable::{FilteredItemExtractable, ItemExtractable};
pub use inventory::SimpleFixedItemInv;
pub use stack::{ItemId, ItemStack, DEFAULT_STACK_SIZE};

/// Resource family for item containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {}

impl ResourceKind for ItemKind {
    type Resource = Option<ItemStack>;
    type Key = ItemId;
    type Amount = u8;
}

/// Filter over item identifiers.
pub type ItemFilter = ResourceFilter<ItemId>;

/// Several item views presented as one.
pub type CombinedFixedItemInvView = CombinedFixedView<ItemKind>;
