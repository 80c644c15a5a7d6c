#![warn(missing_docs)]
//! Shared fixtures for exercising slot views: a mock container with
//! controllable listener behaviour, removal counters, and change recorders.

mod mock;
mod recorder;

use mdattrs_core::{CombinedFixedView, ResourceKind};

pub use mock::MockSlotView;
pub use recorder::{ChangeLog, ChangeRecord, RemovalCounter};

/// Resource family whose slots hold plain counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {}

impl ResourceKind for CounterKind {
    type Resource = u32;
    type Key = u32;
    type Amount = u32;
}

/// Combined view over mock containers.
pub type CombinedCounterView = CombinedFixedView<CounterKind, MockSlotView>;
