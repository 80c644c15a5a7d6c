//! A single view over an ordered list of fixed slot views.
//!
//! Sub-views are laid end to end: the first view's slots come first, then the
//! second's, and so on. A view with zero slots takes up no global indices.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::filter::ResourceFilter;
use crate::listener::{lock, ListenerError, ListenerRemovalToken, ListenerToken};
use crate::view::{slot_listener, slot_out_of_range, FixedSlotView, ResourceKind, SlotListener};

/// Position of a global slot inside one sub-view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotLocation {
    /// Index of the owning sub-view.
    pub view: usize,
    /// Slot index within that sub-view.
    pub slot: usize,
}

/// Presents several [`FixedSlotView`]s as one contiguous view.
///
/// The sub-view list and the start-index table are fixed at construction. If
/// a sub-view's slot count could change, build a new combined view.
pub struct CombinedFixedView<K: ResourceKind, V: FixedSlotView<K> + ?Sized = dyn FixedSlotView<K>> {
    inner: Arc<CombinedInner<K, V>>,
}

struct CombinedInner<K, V: ?Sized> {
    views: Vec<Arc<V>>,
    /// `starts[i]` is the global index of sub-view `i`'s first slot.
    starts: Vec<usize>,
    slot_count: usize,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ResourceKind, V: FixedSlotView<K> + ?Sized> Clone for CombinedFixedView<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: ResourceKind, V: FixedSlotView<K> + ?Sized + 'static> CombinedFixedView<K, V> {
    /// Combine `views` in order.
    pub fn new(views: Vec<Arc<V>>) -> Self {
        let mut starts = Vec::with_capacity(views.len());
        let mut slot_count = 0;
        for view in &views {
            starts.push(slot_count);
            slot_count += view.slot_count();
        }
        Self {
            inner: Arc::new(CombinedInner {
                views,
                starts,
                slot_count,
                _kind: PhantomData,
            }),
        }
    }

    /// The combined sub-views, in order.
    pub fn views(&self) -> &[Arc<V>] {
        &self.inner.views
    }

    /// Sub-view at `index`.
    pub fn view(&self, index: usize) -> Option<&Arc<V>> {
        self.inner.views.get(index)
    }

    /// Number of sub-views.
    pub fn view_count(&self) -> usize {
        self.inner.views.len()
    }

    /// Global index of each sub-view's first slot.
    pub fn partition(&self) -> &[usize] {
        &self.inner.starts
    }

    /// Resolve a global slot to its sub-view and local slot.
    ///
    /// Panics if `slot` is not below [`slot_count`](FixedSlotView::slot_count).
    #[track_caller]
    pub fn locate(&self, slot: usize) -> SlotLocation {
        match self.checked_locate(slot) {
            Some(location) => location,
            None => slot_out_of_range(slot, self.inner.slot_count),
        }
    }

    /// Like [`locate`](Self::locate), returning `None` for out-of-range slots.
    ///
    /// A slot equal to a start index belongs to the sub-view starting there,
    /// which skips over any zero-slot views ending at the same index.
    pub fn checked_locate(&self, slot: usize) -> Option<SlotLocation> {
        if slot >= self.inner.slot_count {
            return None;
        }
        // starts[0] == 0 <= slot, so at least one entry qualifies.
        let view = self.inner.starts.partition_point(|&start| start <= slot) - 1;
        Some(SlotLocation {
            view,
            slot: slot - self.inner.starts[view],
        })
    }

    #[track_caller]
    fn resolve(&self, slot: usize) -> (&V, usize) {
        let location = self.locate(slot);
        (&*self.inner.views[location.view], location.slot)
    }
}

impl<K: ResourceKind, V: FixedSlotView<K> + ?Sized + 'static> FixedSlotView<K>
    for CombinedFixedView<K, V>
{
    fn slot_count(&self) -> usize {
        self.inner.slot_count
    }

    fn resource_at(&self, slot: usize) -> K::Resource {
        let (view, local) = self.resolve(slot);
        view.resource_at(local)
    }

    fn filter_for(&self, slot: usize) -> ResourceFilter<K::Key> {
        let (view, local) = self.resolve(slot);
        view.filter_for(local)
    }

    fn is_valid_for(&self, slot: usize, key: &K::Key) -> bool {
        let (view, local) = self.resolve(slot);
        view.is_valid_for(local, key)
    }

    fn max_amount_for(&self, slot: usize) -> K::Amount {
        let (view, local) = self.resolve(slot);
        view.max_amount_for(local)
    }

    /// Subscribe to every sub-view at once.
    ///
    /// Either all sub-views accept the listener or none keeps it: if one
    /// refuses, or drops the registration before the others are in place, the
    /// registrations already made are removed and [`ListenerError::Rejected`]
    /// is returned. If any sub-view later drops the listener on its own, the
    /// others are dropped too and `removal` fires exactly once.
    ///
    /// The registration keeps this view's sub-views alive until it is removed.
    fn add_listener(
        &self,
        listener: SlotListener<K>,
        removal: ListenerRemovalToken,
    ) -> Result<ListenerToken, ListenerError> {
        let fan_out = Arc::new(FanOut::new(removal));
        let mut tokens = Vec::with_capacity(self.inner.views.len());

        for (index, view) in self.inner.views.iter().enumerate() {
            let start = self.inner.starts[index];
            let combined = Arc::clone(&self.inner);
            let forward = Arc::clone(&listener);
            let state = Arc::clone(&fan_out);
            let wrapped = slot_listener::<K, _>(move |_, local, previous, current| {
                if state.is_cancelled() {
                    return;
                }
                let source = CombinedFixedView {
                    inner: Arc::clone(&combined),
                };
                forward(&source, start + local, previous, current);
            });

            let state = Arc::clone(&fan_out);
            let sub_removal: ListenerRemovalToken = Arc::new(move || state.on_sub_removed(index));

            match view.add_listener(wrapped, sub_removal) {
                Ok(token) => tokens.push(token),
                Err(err) => {
                    debug!(
                        view = index,
                        established = tokens.len(),
                        %err,
                        "sub-view refused listener, rolling back"
                    );
                    fan_out.abandon(tokens);
                    return Err(ListenerError::Rejected { view: index });
                }
            }
        }

        fan_out.arm(tokens)?;
        debug!(views = self.inner.views.len(), "combined listener registered");
        Ok(ListenerToken::new(move || fan_out.remove_all()))
    }
}

impl<K: ResourceKind, V: FixedSlotView<K> + ?Sized> fmt::Debug for CombinedFixedView<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedFixedView")
            .field("views", &self.inner.views.len())
            .field("starts", &self.inner.starts)
            .field("slot_count", &self.inner.slot_count)
            .finish()
    }
}

/// Shared state of one combined subscription.
///
/// Sub-view removals only cascade once the subscription is armed, which
/// happens after every sub-view accepted the listener. A removal seen while
/// still subscribing marks the subscription as dropped, and arming then rolls
/// everything back. `notified` guards the owner's removal token so it fires
/// at most once however many sub-views report removal.
struct FanOut {
    state: Mutex<FanOutState>,
    cancelled: AtomicBool,
    notified: AtomicBool,
    removal: ListenerRemovalToken,
}

struct FanOutState {
    phase: Phase,
    tokens: Vec<ListenerToken>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Subscribing,
    /// A sub-view dropped its registration before arming.
    DroppedEarly(usize),
    Armed,
}

impl FanOut {
    fn new(removal: ListenerRemovalToken) -> Self {
        Self {
            state: Mutex::new(FanOutState {
                phase: Phase::Subscribing,
                tokens: Vec::new(),
            }),
            cancelled: AtomicBool::new(false),
            notified: AtomicBool::new(false),
            removal,
        }
    }

    /// Hand over the sub-registrations once every sub-view accepted.
    fn arm(&self, tokens: Vec<ListenerToken>) -> Result<(), ListenerError> {
        let mut state = lock(&self.state);
        if let Phase::DroppedEarly(view) = state.phase {
            drop(state);
            debug!(view, "sub-view dropped listener while subscribing, rolling back");
            self.abandon(tokens);
            return Err(ListenerError::Rejected { view });
        }
        state.tokens = tokens;
        state.phase = Phase::Armed;
        Ok(())
    }

    /// Undo a subscription that never completed. The owner is not told.
    fn abandon(&self, tokens: Vec<ListenerToken>) {
        self.cancelled.store(true, Ordering::Release);
        for token in &tokens {
            token.remove_listener();
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Remove every sub-registration still held. Each token is used once.
    fn remove_all(&self) {
        self.cancelled.store(true, Ordering::Release);
        let tokens = std::mem::take(&mut lock(&self.state).tokens);
        for token in &tokens {
            token.remove_listener();
        }
    }

    /// Sub-view `view` dropped its registration, on its own or because we asked.
    fn on_sub_removed(&self, view: usize) {
        {
            let mut state = lock(&self.state);
            match state.phase {
                Phase::Subscribing => {
                    state.phase = Phase::DroppedEarly(view);
                    return;
                }
                Phase::DroppedEarly(_) => return,
                Phase::Armed => {}
            }
        }
        self.remove_all();
        if !self.notified.swap(true, Ordering::AcqRel) {
            debug!(view, "combined listener removed");
            (self.removal)();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct Counts;

    impl ResourceKind for Counts {
        type Resource = u32;
        type Key = u32;
        type Amount = u32;
    }

    struct Plain(usize);

    impl FixedSlotView<Counts> for Plain {
        fn slot_count(&self) -> usize {
            self.0
        }

        fn resource_at(&self, slot: usize) -> u32 {
            assert!(slot < self.0);
            slot as u32
        }

        fn filter_for(&self, _slot: usize) -> ResourceFilter<u32> {
            ResourceFilter::anything()
        }

        fn max_amount_for(&self, _slot: usize) -> u32 {
            self.0 as u32
        }
    }

    fn combined(sizes: &[usize]) -> CombinedFixedView<Counts> {
        CombinedFixedView::new(
            sizes
                .iter()
                .map(|&n| Arc::new(Plain(n)) as Arc<dyn FixedSlotView<Counts>>)
                .collect(),
        )
    }

    #[test]
    fn partition_is_prefix_sum() {
        let view = combined(&[3, 0, 2]);
        assert_eq!(view.partition(), &[0, 3, 3]);
        assert_eq!(view.slot_count(), 5);
    }

    #[test]
    fn boundary_skips_empty_views() {
        let view = combined(&[3, 0, 2]);
        let located: Vec<_> = (0..5).map(|g| view.locate(g)).collect();
        assert_eq!(
            located,
            vec![
                SlotLocation { view: 0, slot: 0 },
                SlotLocation { view: 0, slot: 1 },
                SlotLocation { view: 0, slot: 2 },
                SlotLocation { view: 2, slot: 0 },
                SlotLocation { view: 2, slot: 1 },
            ]
        );
    }

    #[test]
    fn leading_and_trailing_empty_views() {
        let view = combined(&[0, 0, 2, 0]);
        assert_eq!(view.locate(0), SlotLocation { view: 2, slot: 0 });
        assert_eq!(view.locate(1), SlotLocation { view: 2, slot: 1 });
        assert_eq!(view.checked_locate(2), None);
    }

    #[test]
    fn reads_delegate_with_local_index() {
        let view = combined(&[2, 3]);
        let values: Vec<u32> = (0..5).map(|g| view.resource_at(g)).collect();
        assert_eq!(values, vec![0, 1, 0, 1, 2]);
        assert_eq!(view.max_amount_for(1), 2);
        assert_eq!(view.max_amount_for(2), 3);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_panics() {
        combined(&[1, 1]).locate(2);
    }

    #[test]
    fn empty_combination_has_no_slots() {
        let view = combined(&[]);
        assert_eq!(view.slot_count(), 0);
        assert_eq!(view.checked_locate(0), None);
    }

    #[test]
    fn unsupported_sub_view_rejects_listener() {
        let view = combined(&[1, 1]);
        let removed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&removed);
        let result = view.add_listener(
            slot_listener::<Counts, _>(|_, _, _, _| {}),
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert_eq!(result.unwrap_err(), ListenerError::Rejected { view: 0 });
        assert_eq!(removed.load(Ordering::SeqCst), 0);
    }
}
