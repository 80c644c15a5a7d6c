//! The read contract shared by every fixed-size slot container.

use std::fmt;
use std::sync::Arc;

use crate::filter::ResourceFilter;
use crate::listener::{ListenerError, ListenerRemovalToken, ListenerToken};

/// Bundles the types a family of containers stores and filters on.
pub trait ResourceKind: Send + Sync + 'static {
    /// Contents of one slot (an item stack, a fluid volume, ...).
    type Resource: Clone + fmt::Debug + Send + Sync;
    /// Identity that filters test against.
    type Key: PartialEq + fmt::Debug + Send + Sync;
    /// Capacity unit for a single slot.
    type Amount: Copy + fmt::Debug + Send + Sync;
}

/// Callback fired when a slot changes: `(view, slot, previous, current)`.
pub type SlotListener<K> = Arc<
    dyn Fn(&dyn FixedSlotView<K>, usize, &<K as ResourceKind>::Resource, &<K as ResourceKind>::Resource)
        + Send
        + Sync,
>;

/// Build a [`SlotListener`] from a closure.
pub fn slot_listener<K, F>(listener: F) -> SlotListener<K>
where
    K: ResourceKind,
    F: Fn(&dyn FixedSlotView<K>, usize, &K::Resource, &K::Resource) + Send + Sync + 'static,
{
    Arc::new(listener)
}

/// A container with a fixed number of slots that can be inspected and
/// observed, but not modified through this interface.
///
/// Slot indices passed to the per-slot methods must be below
/// [`slot_count`](Self::slot_count); implementations panic otherwise.
pub trait FixedSlotView<K: ResourceKind>: Send + Sync {
    /// Number of slots. Fixed for the lifetime of the view.
    fn slot_count(&self) -> usize;

    /// Current contents of `slot`.
    fn resource_at(&self, slot: usize) -> K::Resource;

    /// Filter describing which keys `slot` may ever hold.
    fn filter_for(&self, slot: usize) -> ResourceFilter<K::Key>;

    /// Whether `key` may be stored in `slot`.
    fn is_valid_for(&self, slot: usize, key: &K::Key) -> bool {
        self.filter_for(slot).matches(key)
    }

    /// Largest amount `slot` can hold.
    fn max_amount_for(&self, slot: usize) -> K::Amount;

    /// Subscribe `listener` to slot changes.
    ///
    /// `removal` fires once if the view itself drops the listener (for
    /// example because the container was destroyed) or when the returned
    /// token removes it. Views that cannot report changes return
    /// [`ListenerError::Unsupported`].
    fn add_listener(
        &self,
        listener: SlotListener<K>,
        removal: ListenerRemovalToken,
    ) -> Result<ListenerToken, ListenerError> {
        let _ = (listener, removal);
        Err(ListenerError::Unsupported)
    }
}

impl<K: ResourceKind, V: FixedSlotView<K> + ?Sized> FixedSlotView<K> for Arc<V> {
    fn slot_count(&self) -> usize {
        (**self).slot_count()
    }

    fn resource_at(&self, slot: usize) -> K::Resource {
        (**self).resource_at(slot)
    }

    fn filter_for(&self, slot: usize) -> ResourceFilter<K::Key> {
        (**self).filter_for(slot)
    }

    fn is_valid_for(&self, slot: usize, key: &K::Key) -> bool {
        (**self).is_valid_for(slot, key)
    }

    fn max_amount_for(&self, slot: usize) -> K::Amount {
        (**self).max_amount_for(slot)
    }

    fn add_listener(
        &self,
        listener: SlotListener<K>,
        removal: ListenerRemovalToken,
    ) -> Result<ListenerToken, ListenerError> {
        (**self).add_listener(listener, removal)
    }
}

/// Panic with a uniform message for an out-of-range slot.
#[track_caller]
pub fn slot_out_of_range(slot: usize, slot_count: usize) -> ! {
    panic!("slot {slot} out of range for view with {slot_count} slots")
}
