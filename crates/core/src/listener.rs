//! Listener registration handles and a reusable per-container listener set.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use thiserror::Error;
use tracing::trace;

use crate::view::{FixedSlotView, ResourceKind, SlotListener};

/// Callback told that a listener is no longer registered.
pub type ListenerRemovalToken = Arc<dyn Fn() + Send + Sync>;

/// Failure to register a listener.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ListenerError {
    /// The view cannot report changes.
    #[error("view does not support change listeners")]
    Unsupported,
    /// A view inside a combined view refused the listener; nothing stays registered.
    #[error("sub-view {view} refused the listener")]
    Rejected {
        /// Position of the refusing view.
        view: usize,
    },
}

/// Handle that removes a registered listener.
///
/// Removing is idempotent: calling [`remove_listener`](Self::remove_listener)
/// again after the first time does nothing.
#[derive(Clone)]
pub struct ListenerToken {
    remove: Arc<dyn Fn() + Send + Sync>,
}

impl ListenerToken {
    /// Wrap a removal action.
    pub fn new(remove: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            remove: Arc::new(remove),
        }
    }

    /// Unregister the listener this token was issued for.
    pub fn remove_listener(&self) {
        (self.remove)();
    }
}

impl fmt::Debug for ListenerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ListenerToken")
    }
}

struct Registration<K: ResourceKind> {
    listener: SlotListener<K>,
    removal: ListenerRemovalToken,
}

type RegistrationMap<K> = Mutex<BTreeMap<u64, Registration<K>>>;

/// Listener bookkeeping for a leaf container.
///
/// Callbacks are never invoked while the internal lock is held, so a listener
/// may read the container or remove itself from inside a notification.
pub struct ListenerSet<K: ResourceKind> {
    registrations: Arc<RegistrationMap<K>>,
    next_id: AtomicU64,
}

impl<K: ResourceKind> ListenerSet<K> {
    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            registrations: Arc::new(Mutex::new(BTreeMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a listener. Removing it through the token fires `removal`.
    pub fn add(&self, listener: SlotListener<K>, removal: ListenerRemovalToken) -> ListenerToken {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.registrations).insert(id, Registration { listener, removal });

        let registrations: Weak<RegistrationMap<K>> = Arc::downgrade(&self.registrations);
        ListenerToken::new(move || {
            let Some(registrations) = registrations.upgrade() else {
                return;
            };
            let removed = lock(&registrations).remove(&id);
            if let Some(registration) = removed {
                trace!(listener = id, "listener removed by token");
                (registration.removal)();
            }
        })
    }

    /// Notify every listener of a change to `slot`.
    pub fn fire(
        &self,
        view: &dyn FixedSlotView<K>,
        slot: usize,
        previous: &K::Resource,
        current: &K::Resource,
    ) {
        let listeners: Vec<SlotListener<K>> = lock(&self.registrations)
            .values()
            .map(|registration| Arc::clone(&registration.listener))
            .collect();
        for listener in listeners {
            listener(view, slot, previous, current);
        }
    }

    /// Drop every listener, telling each removal token.
    pub fn remove_all(&self) {
        let drained = std::mem::take(&mut *lock(&self.registrations));
        trace!(count = drained.len(), "removing all listeners");
        for registration in drained.into_values() {
            (registration.removal)();
        }
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        lock(&self.registrations).len()
    }

    /// Returns true when nothing is listening.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: ResourceKind> Default for ListenerSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ResourceKind> fmt::Debug for ListenerSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet").field("len", &self.len()).finish()
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
