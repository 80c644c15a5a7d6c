#![warn(missing_docs)]
//! Core primitives for fixed-slot resource containers: identities, filters,
//! listeners, and the combined view over several containers.

pub mod combined;
pub mod entry;
pub mod filter;
pub mod listener;
pub mod registry;
pub mod view;
pub mod wire;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use combined::{CombinedFixedView, SlotLocation};
pub use entry::{EntryError, RegistryEntry};
pub use filter::ResourceFilter;
pub use listener::{ListenerError, ListenerRemovalToken, ListenerSet, ListenerToken};
pub use registry::{Identifier, IdentifierError, Registries, Registry, RegistryError, RegistryView};
pub use view::{slot_listener, FixedSlotView, ResourceKind, SlotListener};
pub use wire::{PacketReader, PacketWriter, WireError};

/// Whether a transfer should really happen or only report what would happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Simulation {
    /// Compute the result without changing anything.
    Simulate,
    /// Perform the transfer.
    Action,
}

impl Simulation {
    /// Returns true for [`Simulation::Simulate`].
    pub const fn is_simulate(self) -> bool {
        matches!(self, Self::Simulate)
    }

    /// Returns true for [`Simulation::Action`].
    pub const fn is_action(self) -> bool {
        matches!(self, Self::Action)
    }
}
