//! Fluid tanks combined into one view.

use std::sync::Arc;

use mdattrs_core::entry::fluid_registry_id;
use mdattrs_core::{FixedSlotView, Identifier, Simulation};
use mdattrs_fluid::{
    builtin_registries, CombinedFixedFluidInvView, FluidAmount, FluidFilter, FluidKey, FluidKind,
    FluidVolume, SimpleFixedFluidInv,
};
use mdattrs_testkit::{ChangeLog, RemovalCounter};

fn fluid(path: &str) -> FluidKey {
    let registries = builtin_registries().unwrap();
    FluidKey::from_id(
        registries.root(),
        &fluid_registry_id(),
        Identifier::parse(path).unwrap(),
    )
    .unwrap()
}

#[test]
fn boiler_and_lava_tank_share_one_index_space() {
    let water = fluid("mdm:water");
    let lava = fluid("mdm:lava");
    let boiler = Arc::new(
        SimpleFixedFluidInv::new(2, FluidAmount::buckets(4))
            .with_filter(FluidFilter::exact(water.clone())),
    );
    let lava_tank = Arc::new(
        SimpleFixedFluidInv::new(1, FluidAmount::buckets(16))
            .with_filter(FluidFilter::exact(lava.clone())),
    );
    let combined = CombinedFixedFluidInvView::new(vec![
        boiler.clone() as Arc<dyn FixedSlotView<FluidKind>>,
        lava_tank.clone() as Arc<dyn FixedSlotView<FluidKind>>,
    ]);

    assert_eq!(combined.slot_count(), 3);
    assert!(combined.is_valid_for(1, &water));
    assert!(!combined.is_valid_for(2, &water));
    assert!(combined.is_valid_for(2, &lava));
    assert_eq!(combined.max_amount_for(2), FluidAmount::buckets(16));

    let log = ChangeLog::<FluidKind>::new();
    let removals = RemovalCounter::new();
    let token = combined
        .add_listener(log.listener(), removals.token())
        .unwrap();

    let poured = FluidVolume::new(lava.clone(), FluidAmount::buckets(3));
    assert_eq!(
        lava_tank.fill(0, &poured, Simulation::Action),
        FluidAmount::buckets(3)
    );
    assert_eq!(combined.resource_at(2), Some(poured));
    assert_eq!(log.slots(), vec![2]);

    token.remove_listener();
    assert_eq!(removals.count(), 1);
    assert_eq!(boiler.listener_count(), 0);
    assert_eq!(lava_tank.listener_count(), 0);
}
