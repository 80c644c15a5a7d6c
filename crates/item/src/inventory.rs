//! Fixed-size item inventory with per-slot filters and change listeners.

use std::sync::{Mutex, MutexGuard, PoisonError};

use mdattrs_core::view::slot_out_of_range;
use mdattrs_core::{
    FixedSlotView, ListenerError, ListenerRemovalToken, ListenerSet, ListenerToken, Simulation,
    SlotListener,
};
use tracing::trace;

use crate::extractable::ItemExtractable;
use crate::stack::{ItemId, ItemStack, DEFAULT_STACK_SIZE};
use crate::{ItemFilter, ItemKind};

struct InvState {
    slots: Vec<Option<ItemStack>>,
    filters: Vec<ItemFilter>,
    max_stack: u8,
}

/// An inventory with a fixed number of slots.
///
/// Every mutation that changes a slot notifies registered listeners after the
/// inventory lock is released.
pub struct SimpleFixedItemInv {
    state: Mutex<InvState>,
    listeners: ListenerSet<ItemKind>,
}

impl SimpleFixedItemInv {
    /// Create an empty inventory with `size` unrestricted slots.
    pub fn new(size: usize) -> Self {
        Self {
            state: Mutex::new(InvState {
                slots: vec![None; size],
                filters: vec![ItemFilter::anything(); size],
                max_stack: DEFAULT_STACK_SIZE,
            }),
            listeners: ListenerSet::new(),
        }
    }

    /// Cap every slot at `max_stack` items.
    pub fn with_max_stack(mut self, max_stack: u8) -> Self {
        self.state_mut().max_stack = max_stack;
        self
    }

    /// Restrict one slot to items accepted by `filter`.
    ///
    /// Panics if `slot` is out of range.
    pub fn with_slot_filter(mut self, slot: usize, filter: ItemFilter) -> Self {
        let state = self.state_mut();
        let size = state.filters.len();
        match state.filters.get_mut(slot) {
            Some(existing) => *existing = filter,
            None => slot_out_of_range(slot, size),
        }
        self
    }

    /// Restrict every slot to items accepted by `filter`.
    pub fn with_filter(mut self, filter: ItemFilter) -> Self {
        for existing in &mut self.state_mut().filters {
            *existing = filter.clone();
        }
        self
    }

    fn state_mut(&mut self) -> &mut InvState {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> MutexGuard<'_, InvState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a copy of the stack in a slot.
    pub fn get(&self, slot: usize) -> Option<ItemStack> {
        self.state().slots.get(slot).cloned().flatten()
    }

    /// Replace the contents of a slot.
    ///
    /// Returns false (leaving the slot unchanged) if the slot does not exist,
    /// the slot's filter rejects the item, or the stack exceeds the slot's
    /// capacity. A zero-count stack clears the slot.
    pub fn set(&self, slot: usize, stack: Option<ItemStack>) -> bool {
        let stack = stack.filter(|s| s.count > 0);
        let previous = {
            let mut state = self.state();
            if slot >= state.slots.len() {
                return false;
            }
            if let Some(stack) = &stack {
                if stack.count > state.max_stack || !state.filters[slot].matches(&stack.item_id) {
                    return false;
                }
            }
            std::mem::replace(&mut state.slots[slot], stack.clone())
        };
        if previous != stack {
            self.listeners.fire(self, slot, &previous, &stack);
        }
        true
    }

    /// Take the stack out of a slot, leaving it empty.
    pub fn take(&self, slot: usize) -> Option<ItemStack> {
        let previous = {
            let mut state = self.state();
            state.slots.get_mut(slot)?.take()
        };
        if previous.is_some() {
            self.listeners.fire(self, slot, &previous, &None);
        }
        previous
    }

    /// Count the total number of a specific item in the inventory.
    pub fn count_item(&self, item_id: ItemId) -> u32 {
        self.state()
            .slots
            .iter()
            .flatten()
            .filter(|stack| stack.item_id == item_id)
            .map(|stack| stack.count as u32)
            .sum()
    }

    /// Find the first slot containing a specific item.
    pub fn find_item(&self, item_id: ItemId) -> Option<usize> {
        self.state()
            .slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|s| s.item_id == item_id))
    }

    /// Check if the inventory is completely empty.
    pub fn is_empty(&self) -> bool {
        self.state().slots.iter().all(|slot| slot.is_none())
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Drop every listener, as when the inventory's owner is destroyed.
    pub fn drop_listeners(&self) {
        self.listeners.remove_all();
    }
}

impl FixedSlotView<ItemKind> for SimpleFixedItemInv {
    fn slot_count(&self) -> usize {
        self.state().slots.len()
    }

    fn resource_at(&self, slot: usize) -> Option<ItemStack> {
        let state = self.state();
        match state.slots.get(slot) {
            Some(stack) => stack.clone(),
            None => slot_out_of_range(slot, state.slots.len()),
        }
    }

    fn filter_for(&self, slot: usize) -> ItemFilter {
        let state = self.state();
        match state.filters.get(slot) {
            Some(filter) => filter.clone(),
            None => slot_out_of_range(slot, state.filters.len()),
        }
    }

    fn max_amount_for(&self, slot: usize) -> u8 {
        let state = self.state();
        if slot >= state.slots.len() {
            slot_out_of_range(slot, state.slots.len());
        }
        state.max_stack
    }

    fn add_listener(
        &self,
        listener: SlotListener<ItemKind>,
        removal: ListenerRemovalToken,
    ) -> Result<ListenerToken, ListenerError> {
        Ok(self.listeners.add(listener, removal))
    }
}

impl ItemExtractable for SimpleFixedItemInv {
    /// Pull up to `max_amount` items of one kind, scanning slots in order.
    ///
    /// The first stack accepted by `filter` decides the item; later slots only
    /// contribute stacks that merge with it.
    fn attempt_extraction(
        &self,
        filter: &ItemFilter,
        max_amount: u8,
        simulation: Simulation,
    ) -> Option<ItemStack> {
        let mut extracted: Option<ItemStack> = None;
        let mut changes = Vec::new();
        {
            let mut state = self.state();
            for slot in 0..state.slots.len() {
                let remaining = max_amount - extracted.as_ref().map_or(0, |s| s.count);
                if remaining == 0 {
                    break;
                }
                let Some(stack) = state.slots[slot].as_ref() else {
                    continue;
                };
                if !filter.matches(&stack.item_id) {
                    continue;
                }
                if extracted.as_ref().is_some_and(|acc| !acc.can_merge(stack)) {
                    continue;
                }
                let previous = state.slots[slot].clone();
                let mut working = stack.clone();
                let Some(part) = working.split(remaining) else {
                    continue;
                };
                match extracted.as_mut() {
                    Some(acc) => acc.count += part.count,
                    None => extracted = Some(part),
                }
                if simulation.is_action() {
                    let current = (working.count > 0).then_some(working);
                    state.slots[slot] = current.clone();
                    changes.push((slot, previous, current));
                }
            }
        }
        if let Some(stack) = &extracted {
            trace!(item = stack.item_id, count = stack.count, ?simulation, "extracted");
        }
        for (slot, previous, current) in changes {
            self.listeners.fire(self, slot, &previous, &current);
        }
        extracted
    }
}
