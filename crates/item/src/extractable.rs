//! Extraction channels and the filtering wrapper around them.

use std::sync::Arc;

use mdattrs_core::Simulation;

use crate::stack::ItemStack;
use crate::ItemFilter;

/// Something items can be pulled out of.
pub trait ItemExtractable: Send + Sync {
    /// Extract up to `max_amount` items accepted by `filter`.
    ///
    /// With [`Simulation::Simulate`] nothing changes and the result describes
    /// what an action would return.
    fn attempt_extraction(
        &self,
        filter: &ItemFilter,
        max_amount: u8,
        simulation: Simulation,
    ) -> Option<ItemStack>;

    /// Extract up to `max_amount` items of whatever kind comes first.
    fn attempt_any_extraction(&self, max_amount: u8, simulation: Simulation) -> Option<ItemStack> {
        self.attempt_extraction(&ItemFilter::anything(), max_amount, simulation)
    }

    /// Restrict this channel to items accepted by `filter`.
    fn filtered(self: Arc<Self>, filter: ItemFilter) -> Arc<dyn ItemExtractable>
    where
        Self: Sized + 'static,
    {
        Arc::new(FilteredItemExtractable::new(self, filter))
    }
}

/// An [`ItemExtractable`] that only hands out items its filter accepts.
///
/// Filtering an already filtered channel composes the filters and keeps the
/// same underlying channel, so wrappers never stack.
#[derive(Clone)]
pub struct FilteredItemExtractable {
    real: Arc<dyn ItemExtractable>,
    filter: ItemFilter,
}

impl FilteredItemExtractable {
    /// Wrap `real`, passing through only items accepted by `filter`.
    pub fn new(real: Arc<dyn ItemExtractable>, filter: ItemFilter) -> Self {
        Self { real, filter }
    }

    /// The stored filter.
    pub fn filter(&self) -> &ItemFilter {
        &self.filter
    }

    /// The wrapped channel.
    pub fn real(&self) -> &Arc<dyn ItemExtractable> {
        &self.real
    }

    /// A wrapper over the same channel accepting only items both filters accept.
    pub fn refiltered(&self, filter: &ItemFilter) -> Self {
        Self {
            real: Arc::clone(&self.real),
            filter: filter.and(&self.filter),
        }
    }
}

impl ItemExtractable for FilteredItemExtractable {
    fn attempt_extraction(
        &self,
        filter: &ItemFilter,
        max_amount: u8,
        simulation: Simulation,
    ) -> Option<ItemStack> {
        self.real
            .attempt_extraction(&filter.and(&self.filter), max_amount, simulation)
    }

    fn attempt_any_extraction(&self, max_amount: u8, simulation: Simulation) -> Option<ItemStack> {
        self.real
            .attempt_extraction(&self.filter, max_amount, simulation)
    }

    fn filtered(self: Arc<Self>, filter: ItemFilter) -> Arc<dyn ItemExtractable> {
        Arc::new(self.refiltered(&filter))
    }
}

impl std::fmt::Debug for FilteredItemExtractable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilteredItemExtractable")
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimpleFixedItemInv;

    fn stocked() -> Arc<SimpleFixedItemInv> {
        let inv = SimpleFixedItemInv::new(3);
        inv.set(0, Some(ItemStack::new(1, 10)));
        inv.set(1, Some(ItemStack::new(2, 10)));
        inv.set(2, Some(ItemStack::new(3, 10)));
        Arc::new(inv)
    }

    #[test]
    fn extraction_requires_both_filters() {
        let inv = stocked();
        let filtered = FilteredItemExtractable::new(inv.clone(), ItemFilter::one_of([2, 3]));

        assert_eq!(
            filtered.attempt_extraction(&ItemFilter::exact(1), 5, Simulation::Action),
            None
        );
        assert_eq!(
            filtered.attempt_extraction(&ItemFilter::one_of([1, 3]), 5, Simulation::Action),
            Some(ItemStack::new(3, 5))
        );
        assert_eq!(inv.count_item(3), 5);
    }

    #[test]
    fn any_extraction_uses_stored_filter() {
        let inv = stocked();
        let filtered = FilteredItemExtractable::new(inv.clone(), ItemFilter::exact(2));

        assert_eq!(
            filtered.attempt_any_extraction(4, Simulation::Simulate),
            Some(ItemStack::new(2, 4))
        );
        assert_eq!(inv.count_item(2), 10);
    }

    #[test]
    fn refiltering_keeps_depth_one() {
        let inv = stocked();
        let real: Arc<dyn ItemExtractable> = inv.clone();
        let once = FilteredItemExtractable::new(Arc::clone(&real), ItemFilter::one_of([1, 2]));
        let twice = once.refiltered(&ItemFilter::one_of([2, 3]));

        assert!(Arc::ptr_eq(twice.real(), &real));
        assert!(twice.filter().matches(&2));
        assert!(!twice.filter().matches(&1));
        assert!(!twice.filter().matches(&3));
        assert_eq!(twice.filter().depth(), 1);

        let extracted = Arc::new(twice)
            .filtered(ItemFilter::anything())
            .attempt_any_extraction(64, Simulation::Action);
        assert_eq!(extracted, Some(ItemStack::new(2, 10)));
    }

    #[test]
    fn leaf_filtered_wraps_once() {
        let inv = stocked();
        let channel = inv.clone().filtered(ItemFilter::exact(1));

        assert_eq!(
            channel.attempt_extraction(&ItemFilter::anything(), 64, Simulation::Action),
            Some(ItemStack::new(1, 10))
        );
        assert!(inv.find_item(1).is_none());
    }
}
