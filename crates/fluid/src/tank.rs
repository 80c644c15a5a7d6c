//! Fixed-size set of fluid tanks.

use std::sync::{Mutex, MutexGuard, PoisonError};

use mdattrs_core::view::slot_out_of_range;
use mdattrs_core::{
    FixedSlotView, ListenerError, ListenerRemovalToken, ListenerSet, ListenerToken, Simulation,
    SlotListener,
};
use tracing::trace;

use crate::amount::{FluidAmount, FluidVolume};
use crate::key::FluidKey;
use crate::{FluidFilter, FluidKind};

struct TankState {
    tanks: Vec<Option<FluidVolume>>,
    filters: Vec<FluidFilter>,
}

/// A fixed number of tanks sharing one capacity.
pub struct SimpleFixedFluidInv {
    state: Mutex<TankState>,
    capacity: FluidAmount,
    listeners: ListenerSet<FluidKind>,
}

impl SimpleFixedFluidInv {
    /// `tanks` empty tanks holding up to `capacity` each.
    pub fn new(tanks: usize, capacity: FluidAmount) -> Self {
        Self {
            state: Mutex::new(TankState {
                tanks: vec![None; tanks],
                filters: vec![FluidFilter::anything(); tanks],
            }),
            capacity,
            listeners: ListenerSet::new(),
        }
    }

    /// Restrict every tank to fluids accepted by `filter`.
    pub fn with_filter(mut self, filter: FluidFilter) -> Self {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        for existing in &mut state.filters {
            *existing = filter.clone();
        }
        self
    }

    /// Restrict one tank to fluids accepted by `filter`.
    ///
    /// Panics if `tank` is out of range.
    pub fn with_tank_filter(mut self, tank: usize, filter: FluidFilter) -> Self {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        let count = state.filters.len();
        match state.filters.get_mut(tank) {
            Some(existing) => *existing = filter,
            None => slot_out_of_range(tank, count),
        }
        self
    }

    fn state(&self) -> MutexGuard<'_, TankState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Capacity of every tank.
    pub fn capacity(&self) -> FluidAmount {
        self.capacity
    }

    /// A copy of a tank's contents.
    pub fn get(&self, tank: usize) -> Option<FluidVolume> {
        self.state().tanks.get(tank).cloned().flatten()
    }

    /// Replace a tank's contents.
    ///
    /// Returns false (leaving the tank unchanged) if the tank does not exist,
    /// its filter rejects the fluid, or the volume exceeds the capacity.
    /// Empty volumes clear the tank.
    pub fn set(&self, tank: usize, volume: Option<FluidVolume>) -> bool {
        let volume = volume.filter(|v| !v.is_empty());
        let previous = {
            let mut state = self.state();
            if tank >= state.tanks.len() {
                return false;
            }
            if let Some(volume) = &volume {
                if volume.amount() > self.capacity || !state.filters[tank].matches(volume.key()) {
                    return false;
                }
            }
            std::mem::replace(&mut state.tanks[tank], volume.clone())
        };
        if previous != volume {
            self.listeners.fire(self, tank, &previous, &volume);
        }
        true
    }

    /// Empty a tank, returning what it held.
    pub fn take(&self, tank: usize) -> Option<FluidVolume> {
        let previous = self.state().tanks.get_mut(tank)?.take();
        if previous.is_some() {
            self.listeners.fire(self, tank, &previous, &None);
        }
        previous
    }

    /// Pour `volume` into a tank, returning how much was accepted.
    ///
    /// A tank only accepts fluid its filter allows and only when empty or
    /// already holding the same fluid.
    pub fn fill(&self, tank: usize, volume: &FluidVolume, simulation: Simulation) -> FluidAmount {
        if volume.is_empty() {
            return FluidAmount::ZERO;
        }
        let change = {
            let mut state = self.state();
            let Some(filter) = state.filters.get(tank) else {
                return FluidAmount::ZERO;
            };
            if !filter.matches(volume.key()) {
                return FluidAmount::ZERO;
            }
            let held = match &state.tanks[tank] {
                Some(current) if !current.can_merge(volume) => return FluidAmount::ZERO,
                Some(current) => current.amount(),
                None => FluidAmount::ZERO,
            };
            let accepted = volume.amount().min(self.capacity.saturating_sub(held));
            if accepted.is_zero() || simulation.is_simulate() {
                return accepted;
            }
            let current = Some(FluidVolume::new(volume.key().clone(), held + accepted));
            let previous = std::mem::replace(&mut state.tanks[tank], current.clone());
            (previous, current, accepted)
        };
        let (previous, current, accepted) = change;
        trace!(tank, %accepted, "filled");
        self.listeners.fire(self, tank, &previous, &current);
        accepted
    }

    /// Drain up to `max` from a tank.
    pub fn drain(
        &self,
        tank: usize,
        max: FluidAmount,
        simulation: Simulation,
    ) -> Option<FluidVolume> {
        let (previous, current, drained) = {
            let mut state = self.state();
            let mut remaining = state.tanks.get(tank)?.clone()?;
            let drained = remaining.split(max)?;
            if simulation.is_simulate() {
                return Some(drained);
            }
            let current = (!remaining.is_empty()).then_some(remaining);
            let previous = std::mem::replace(&mut state.tanks[tank], current.clone());
            (previous, current, drained)
        };
        trace!(tank, amount = %drained.amount(), "drained");
        self.listeners.fire(self, tank, &previous, &current);
        Some(drained)
    }

    /// Total amount of `key` across all tanks.
    pub fn amount_of(&self, key: &FluidKey) -> FluidAmount {
        self.state()
            .tanks
            .iter()
            .flatten()
            .filter(|volume| volume.key() == key)
            .fold(FluidAmount::ZERO, |total, volume| total + volume.amount())
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Drop every listener, as when the tank's owner is destroyed.
    pub fn drop_listeners(&self) {
        self.listeners.remove_all();
    }
}

impl FixedSlotView<FluidKind> for SimpleFixedFluidInv {
    fn slot_count(&self) -> usize {
        self.state().tanks.len()
    }

    fn resource_at(&self, tank: usize) -> Option<FluidVolume> {
        let state = self.state();
        match state.tanks.get(tank) {
            Some(volume) => volume.clone(),
            None => slot_out_of_range(tank, state.tanks.len()),
        }
    }

    fn filter_for(&self, tank: usize) -> FluidFilter {
        let state = self.state();
        match state.filters.get(tank) {
            Some(filter) => filter.clone(),
            None => slot_out_of_range(tank, state.filters.len()),
        }
    }

    fn max_amount_for(&self, tank: usize) -> FluidAmount {
        let count = self.slot_count();
        if tank >= count {
            slot_out_of_range(tank, count);
        }
        self.capacity
    }

    fn add_listener(
        &self,
        listener: SlotListener<FluidKind>,
        removal: ListenerRemovalToken,
    ) -> Result<ListenerToken, ListenerError> {
        Ok(self.listeners.add(listener, removal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registries::builtin_registries;
    use mdattrs_core::entry::fluid_registry_id;
    use mdattrs_core::Identifier;
    use mdattrs_testkit::{ChangeLog, RemovalCounter};

    fn key(path: &str) -> FluidKey {
        let registries = builtin_registries().unwrap();
        FluidKey::from_id(
            registries.root(),
            &fluid_registry_id(),
            Identifier::parse(path).unwrap(),
        )
        .unwrap()
    }

    fn buckets(key: &FluidKey, count: u64) -> FluidVolume {
        FluidVolume::new(key.clone(), FluidAmount::buckets(count))
    }

    #[test]
    fn set_checks_capacity_and_filter() {
        let water = key("mdm:water");
        let lava = key("mdm:lava");
        let tanks = SimpleFixedFluidInv::new(2, FluidAmount::buckets(4))
            .with_tank_filter(1, FluidFilter::exact(water.clone()));

        assert!(!tanks.set(0, Some(buckets(&water, 5))));
        assert!(tanks.set(0, Some(buckets(&lava, 4))));
        assert!(!tanks.set(1, Some(buckets(&lava, 1))));
        assert!(tanks.set(1, Some(buckets(&water, 1))));
        assert!(!tanks.set(2, Some(buckets(&water, 1))));
        assert!(tanks.is_valid_for(1, &water));
        assert!(!tanks.is_valid_for(1, &lava));
        assert_eq!(tanks.max_amount_for(0), FluidAmount::buckets(4));
    }

    #[test]
    fn fill_tops_up_matching_fluid() {
        let water = key("mdm:water");
        let lava = key("mdm:lava");
        let tanks = SimpleFixedFluidInv::new(1, FluidAmount::buckets(2));
        let log = ChangeLog::<FluidKind>::new();
        let _token = tanks
            .add_listener(log.listener(), RemovalCounter::new().token())
            .unwrap();

        assert_eq!(
            tanks.fill(0, &buckets(&water, 3), Simulation::Simulate),
            FluidAmount::buckets(2)
        );
        assert!(log.is_empty());

        let half = FluidVolume::new(water.clone(), FluidAmount::from_millibuckets(1500));
        assert_eq!(tanks.fill(0, &half, Simulation::Action), half.amount());
        assert_eq!(
            tanks.fill(0, &buckets(&water, 1), Simulation::Action),
            FluidAmount::from_millibuckets(500)
        );
        assert_eq!(tanks.fill(0, &buckets(&lava, 1), Simulation::Action), FluidAmount::ZERO);
        assert_eq!(tanks.amount_of(&water), FluidAmount::buckets(2));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn drain_empties_tank() {
        let water = key("mdm:water");
        let tanks = SimpleFixedFluidInv::new(1, FluidAmount::buckets(8));
        tanks.set(0, Some(buckets(&water, 3)));

        let simulated = tanks.drain(0, FluidAmount::buckets(1), Simulation::Simulate);
        assert_eq!(simulated, Some(buckets(&water, 1)));
        assert_eq!(tanks.amount_of(&water), FluidAmount::buckets(3));

        let drained = tanks.drain(0, FluidAmount::buckets(5), Simulation::Action);
        assert_eq!(drained, Some(buckets(&water, 3)));
        assert_eq!(tanks.get(0), None);
        assert_eq!(tanks.drain(0, FluidAmount::BUCKET, Simulation::Action), None);
    }

    #[test]
    fn empty_key_clears_tank() {
        let registries = builtin_registries().unwrap();
        let empty = FluidKey::empty(registries.root()).unwrap();
        let tanks = SimpleFixedFluidInv::new(1, FluidAmount::BUCKET);
        tanks.set(0, Some(buckets(&key("mdm:water"), 1)));

        assert!(tanks.set(0, Some(FluidVolume::new(empty, FluidAmount::BUCKET))));
        assert_eq!(tanks.resource_at(0), None);
    }
}
