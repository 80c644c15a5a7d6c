//! Mock slot container with switchable listener behaviour.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use mdattrs_core::view::slot_out_of_range;
use mdattrs_core::{
    FixedSlotView, ListenerError, ListenerRemovalToken, ListenerSet, ListenerToken, ResourceFilter,
    SlotListener,
};
use tracing::debug;

use crate::CounterKind;

/// In-memory slot container for tests.
///
/// Listener registration can be switched to fail or to be dropped as soon as
/// it is made, and every listener can be dropped from the container side to
/// simulate its owner going away.
pub struct MockSlotView {
    values: Mutex<Vec<u32>>,
    max_amount: u32,
    filter: ResourceFilter<u32>,
    listeners: ListenerSet<CounterKind>,
    reject_listeners: AtomicBool,
    drop_on_register: AtomicBool,
}

impl MockSlotView {
    /// A view with `slots` zeroed slots accepting anything.
    pub fn new(slots: usize) -> Self {
        Self::from_values(vec![0; slots])
    }

    /// A view holding `values`, one per slot.
    pub fn from_values(values: Vec<u32>) -> Self {
        Self {
            values: Mutex::new(values),
            max_amount: u32::MAX,
            filter: ResourceFilter::anything(),
            listeners: ListenerSet::new(),
            reject_listeners: AtomicBool::new(false),
            drop_on_register: AtomicBool::new(false),
        }
    }

    /// Use `filter` for every slot.
    pub fn with_filter(mut self, filter: ResourceFilter<u32>) -> Self {
        self.filter = filter;
        self
    }

    /// Report `max_amount` as every slot's capacity.
    pub fn with_max_amount(mut self, max_amount: u32) -> Self {
        self.max_amount = max_amount;
        self
    }

    /// A view whose listener registration always fails.
    pub fn rejecting(slots: usize) -> Self {
        let view = Self::new(slots);
        view.set_reject_listeners(true);
        view
    }

    /// Make subsequent listener registrations fail (or succeed again).
    pub fn set_reject_listeners(&self, reject: bool) {
        self.reject_listeners.store(reject, Ordering::SeqCst);
    }

    /// A view that accepts a listener and then drops it straight away.
    pub fn dropping_on_register(slots: usize) -> Self {
        let view = Self::new(slots);
        view.drop_on_register.store(true, Ordering::SeqCst);
        view
    }

    /// Store `value` in `slot` and notify listeners.
    ///
    /// Panics if `slot` is out of range.
    pub fn set(&self, slot: usize, value: u32) {
        let previous = {
            let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
            let count = values.len();
            match values.get_mut(slot) {
                Some(current) => std::mem::replace(current, value),
                None => slot_out_of_range(slot, count),
            }
        };
        self.listeners.fire(self, slot, &previous, &value);
    }

    /// Number of live listener registrations.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Drop every listener, notifying each removal token.
    pub fn drop_listeners(&self) {
        debug!(count = self.listeners.len(), "mock view dropping listeners");
        self.listeners.remove_all();
    }
}

impl FixedSlotView<CounterKind> for MockSlotView {
    fn slot_count(&self) -> usize {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn resource_at(&self, slot: usize) -> u32 {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        match values.get(slot) {
            Some(value) => *value,
            None => slot_out_of_range(slot, values.len()),
        }
    }

    fn filter_for(&self, slot: usize) -> ResourceFilter<u32> {
        let count = self.slot_count();
        if slot >= count {
            slot_out_of_range(slot, count);
        }
        self.filter.clone()
    }

    fn max_amount_for(&self, slot: usize) -> u32 {
        let count = self.slot_count();
        if slot >= count {
            slot_out_of_range(slot, count);
        }
        self.max_amount
    }

    fn add_listener(
        &self,
        listener: SlotListener<CounterKind>,
        removal: ListenerRemovalToken,
    ) -> Result<ListenerToken, ListenerError> {
        if self.reject_listeners.load(Ordering::SeqCst) {
            return Err(ListenerError::Unsupported);
        }
        let token = self.listeners.add(listener, removal);
        if self.drop_on_register.load(Ordering::SeqCst) {
            self.listeners.remove_all();
        }
        Ok(token)
    }
}
