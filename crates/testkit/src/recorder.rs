//! Recorders for listener callbacks and removal notifications.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use mdattrs_core::{slot_listener, ListenerRemovalToken, ResourceKind, SlotListener};
use serde::Serialize;

/// Counts how often a removal token fired.
#[derive(Debug, Clone, Default)]
pub struct RemovalCounter {
    fired: Arc<AtomicUsize>,
}

impl RemovalCounter {
    /// A counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// A removal token that bumps this counter.
    pub fn token(&self) -> ListenerRemovalToken {
        let fired = Arc::clone(&self.fired);
        Arc::new(move || {
            fired.fetch_add(1, Ordering::SeqCst);
        })
    }

    /// Times any token from this counter fired.
    pub fn count(&self) -> usize {
        self.fired.load(Ordering::SeqCst)
    }
}

/// One observed slot change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRecord<R> {
    /// Slot index as reported to the listener.
    pub slot: usize,
    /// Contents before the change.
    pub previous: R,
    /// Contents after the change.
    pub current: R,
    /// Slot count of the view passed as the change source.
    pub source_slots: usize,
}

/// Records every change delivered to its listeners.
pub struct ChangeLog<K: ResourceKind> {
    records: Arc<Mutex<Vec<ChangeRecord<K::Resource>>>>,
}

impl<K: ResourceKind> ChangeLog<K> {
    /// An empty log.
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A listener appending to this log.
    pub fn listener(&self) -> SlotListener<K> {
        let records = Arc::clone(&self.records);
        slot_listener::<K, _>(move |view, slot, previous, current| {
            records
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(ChangeRecord {
                    slot,
                    previous: previous.clone(),
                    current: current.clone(),
                    source_slots: view.slot_count(),
                });
        })
    }

    /// Everything recorded so far.
    pub fn records(&self) -> Vec<ChangeRecord<K::Resource>> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Slot indices recorded so far, in order.
    pub fn slots(&self) -> Vec<usize> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|record| record.slot)
            .collect()
    }

    /// Number of recorded changes.
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl<K: ResourceKind> ChangeLog<K>
where
    K::Resource: Serialize,
{
    /// Write the log as newline-delimited JSON, creating parent dirs if needed.
    pub fn write_jsonl<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let mut file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        for record in self.records() {
            let line = serde_json::to_string(&record)?;
            file.write_all(line.as_bytes())?;
            file.write_all(b"\n")?;
        }
        Ok(())
    }
}

impl<K: ResourceKind> Default for ChangeLog<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ResourceKind> Clone for ChangeLog<K> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CounterKind, MockSlotView};
    use mdattrs_core::FixedSlotView;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn change_log_records_mock_updates() {
        let view = MockSlotView::new(3);
        let log = ChangeLog::<CounterKind>::new();
        let removals = RemovalCounter::new();
        let token = view.add_listener(log.listener(), removals.token()).unwrap();

        view.set(1, 7);
        view.set(1, 9);
        assert_eq!(log.slots(), vec![1, 1]);
        assert_eq!(
            log.records()[1],
            ChangeRecord {
                slot: 1,
                previous: 7,
                current: 9,
                source_slots: 3
            }
        );

        token.remove_listener();
        view.set(0, 1);
        assert_eq!(log.len(), 2);
        assert_eq!(removals.count(), 1);
    }

    #[test]
    fn dropping_listeners_fires_removal_tokens() {
        let view = MockSlotView::new(1);
        let removals = RemovalCounter::new();
        let log = ChangeLog::<CounterKind>::new();
        view.add_listener(log.listener(), removals.token()).unwrap();
        view.add_listener(log.listener(), removals.token()).unwrap();

        view.drop_listeners();
        assert_eq!(removals.count(), 2);
        assert_eq!(view.listener_count(), 0);
    }

    #[test]
    fn rejecting_view_refuses_listeners() {
        let view = MockSlotView::rejecting(2);
        let log = ChangeLog::<CounterKind>::new();
        assert!(view.add_listener(log.listener(), RemovalCounter::new().token()).is_err());
        view.set_reject_listeners(false);
        assert!(view.add_listener(log.listener(), RemovalCounter::new().token()).is_ok());
    }

    #[test]
    fn change_log_writes_jsonl() {
        let path = std::env::temp_dir().join(format!(
            "mdattrs-changes-{}.jsonl",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let view = MockSlotView::new(2);
        let log = ChangeLog::<CounterKind>::new();
        let _token = view.add_listener(log.listener(), RemovalCounter::new().token()).unwrap();
        view.set(0, 5);
        view.set(1, 6);

        log.write_jsonl(&path).expect("write succeeds");
        let contents = fs::read_to_string(&path).expect("file readable");
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("\"current\":6"));
    }
}
