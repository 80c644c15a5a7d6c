use std::sync::Arc;

use anyhow::{Context, Result};
use mdattrs_core::entry::fluid_registry_id;
use mdattrs_core::{FixedSlotView, Identifier};
use mdattrs_fluid::{
    CombinedFixedFluidInvView, FluidAmount, FluidFilter, FluidKey, FluidKind, FluidRegistries,
    SimpleFixedFluidInv,
};
use mdattrs_item::{CombinedFixedItemInvView, ItemFilter, ItemKind, SimpleFixedItemInv};
use serde::Serialize;
use tracing::debug;

use crate::config::{InventoryConfig, LayoutConfig, TankConfig};

/// Combined item and fluid views built from a [`LayoutConfig`].
pub struct Layout {
    items: CombinedFixedItemInvView,
    inventory_names: Vec<String>,
    fluids: CombinedFixedFluidInvView,
    tank_names: Vec<String>,
}

/// One global slot of a combined view.
#[derive(Debug, Serialize)]
pub struct SlotEntry {
    pub global: usize,
    pub container: String,
    pub local: usize,
    pub max_amount: u64,
}

#[derive(Debug, Serialize)]
pub struct SlotMap {
    pub items: Vec<SlotEntry>,
    pub fluids: Vec<SlotEntry>,
}

impl Layout {
    pub fn build(config: &LayoutConfig, registries: &FluidRegistries) -> Result<Self> {
        let inventories: Vec<Arc<dyn FixedSlotView<ItemKind>>> = config
            .inventory
            .iter()
            .map(|inv| Arc::new(build_inventory(inv)) as Arc<dyn FixedSlotView<ItemKind>>)
            .collect();
        let tanks = config
            .tank
            .iter()
            .map(|tank| {
                build_tanks(tank, registries)
                    .map(|tanks| Arc::new(tanks) as Arc<dyn FixedSlotView<FluidKind>>)
            })
            .collect::<Result<Vec<_>>>()?;

        let layout = Self {
            items: CombinedFixedItemInvView::new(inventories),
            inventory_names: config.inventory.iter().map(|inv| inv.name.clone()).collect(),
            fluids: CombinedFixedFluidInvView::new(tanks),
            tank_names: config.tank.iter().map(|tank| tank.name.clone()).collect(),
        };
        debug!(
            item_slots = layout.items.slot_count(),
            tanks = layout.fluids.slot_count(),
            "layout built"
        );
        Ok(layout)
    }

    pub fn items(&self) -> &CombinedFixedItemInvView {
        &self.items
    }

    pub fn fluids(&self) -> &CombinedFixedFluidInvView {
        &self.fluids
    }

    /// Every global slot with its owner and capacity.
    pub fn slot_map(&self) -> SlotMap {
        let items = (0..self.items.slot_count())
            .map(|global| {
                let location = self.items.locate(global);
                SlotEntry {
                    global,
                    container: self.inventory_names[location.view].clone(),
                    local: location.slot,
                    max_amount: u64::from(self.items.max_amount_for(global)),
                }
            })
            .collect();
        let fluids = (0..self.fluids.slot_count())
            .map(|global| {
                let location = self.fluids.locate(global);
                SlotEntry {
                    global,
                    container: self.tank_names[location.view].clone(),
                    local: location.slot,
                    max_amount: self.fluids.max_amount_for(global).as_millibuckets(),
                }
            })
            .collect();
        SlotMap { items, fluids }
    }
}

fn build_inventory(config: &InventoryConfig) -> SimpleFixedItemInv {
    let inv = SimpleFixedItemInv::new(config.slots).with_max_stack(config.max_stack);
    if config.allow.is_empty() {
        inv
    } else {
        inv.with_filter(ItemFilter::one_of(config.allow.iter().copied()))
    }
}

fn build_tanks(config: &TankConfig, registries: &FluidRegistries) -> Result<SimpleFixedFluidInv> {
    let tanks = SimpleFixedFluidInv::new(
        config.tanks,
        FluidAmount::from_millibuckets(config.capacity),
    );
    if config.fluids.is_empty() {
        return Ok(tanks);
    }
    let keys = config
        .fluids
        .iter()
        .map(|name| {
            let id = Identifier::parse(name)
                .with_context(|| format!("tank {}: invalid fluid id {name:?}", config.name))?;
            FluidKey::from_id(registries.root(), &fluid_registry_id(), id)
                .with_context(|| format!("tank {}: unknown fluid {name:?}", config.name))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(tanks.with_filter(FluidFilter::one_of(keys)))
}
