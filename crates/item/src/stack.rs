//! Item stacks held by item containers.

use serde::{Deserialize, Serialize};

/// Item identifier referencing the item registry.
pub type ItemId = u16;

/// Maximum stack size for most items.
pub const DEFAULT_STACK_SIZE: u8 = 64;

/// A stack of identical items occupying one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Item type identifier.
    pub item_id: ItemId,
    /// Number of items in this stack.
    pub count: u8,
    /// Optional item metadata (damage, enchantments, ...).
    pub metadata: Option<Vec<u8>>,
}

impl ItemStack {
    /// Create a new item stack.
    pub fn new(item_id: ItemId, count: u8) -> Self {
        Self {
            item_id,
            count,
            metadata: None,
        }
    }

    /// Create an item stack with metadata.
    pub fn with_metadata(item_id: ItemId, count: u8, metadata: Vec<u8>) -> Self {
        Self {
            item_id,
            count,
            metadata: Some(metadata),
        }
    }

    /// Whether two stacks hold the same item and could share a slot.
    pub fn can_merge(&self, other: &ItemStack) -> bool {
        self.item_id == other.item_id && self.metadata == other.metadata
    }

    /// Remove up to `amount` items, returning how many were removed.
    pub fn remove(&mut self, amount: u8) -> u8 {
        let removed = amount.min(self.count);
        self.count -= removed;
        removed
    }

    /// Split off up to `amount` items into a new stack.
    ///
    /// Returns `None` when nothing can be taken.
    pub fn split(&mut self, amount: u8) -> Option<ItemStack> {
        let taken = self.remove(amount);
        if taken == 0 {
            return None;
        }
        Some(ItemStack {
            item_id: self.item_id,
            count: taken,
            metadata: self.metadata.clone(),
        })
    }
}
