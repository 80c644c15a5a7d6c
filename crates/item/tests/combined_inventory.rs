//! Item inventories combined into one view.

use std::sync::Arc;

use mdattrs_core::{FixedSlotView, SlotLocation};
use mdattrs_item::{
    CombinedFixedItemInvView, ItemFilter, ItemKind, ItemStack, SimpleFixedItemInv,
};
use mdattrs_testkit::{ChangeLog, ChangeRecord, RemovalCounter};

fn furnace() -> (Arc<SimpleFixedItemInv>, Arc<SimpleFixedItemInv>, Arc<SimpleFixedItemInv>) {
    let input = Arc::new(SimpleFixedItemInv::new(1));
    let fuel = Arc::new(SimpleFixedItemInv::new(1).with_filter(ItemFilter::one_of([263, 5])));
    let output = Arc::new(SimpleFixedItemInv::new(2).with_max_stack(16));
    (input, fuel, output)
}

fn combine(parts: &[&Arc<SimpleFixedItemInv>]) -> CombinedFixedItemInvView {
    CombinedFixedItemInvView::new(
        parts
            .iter()
            .map(|inv| Arc::clone(inv) as Arc<dyn FixedSlotView<ItemKind>>)
            .collect(),
    )
}

#[test]
fn reads_delegate_to_owning_inventory() {
    let (input, fuel, output) = furnace();
    let combined = combine(&[&input, &fuel, &output]);

    assert_eq!(combined.slot_count(), 4);
    assert_eq!(combined.partition(), &[0, 1, 2]);
    assert_eq!(combined.locate(3), SlotLocation { view: 2, slot: 1 });

    output.set(1, Some(ItemStack::new(42, 3)));
    assert_eq!(combined.resource_at(3), Some(ItemStack::new(42, 3)));
    assert_eq!(combined.resource_at(0), None);

    assert!(combined.is_valid_for(1, &263));
    assert!(!combined.is_valid_for(1, &42));
    assert!(combined.is_valid_for(0, &42));
    assert_eq!(combined.max_amount_for(0), 64);
    assert_eq!(combined.max_amount_for(2), 16);
}

#[test]
fn changes_arrive_with_global_indices() {
    let (input, fuel, output) = furnace();
    let combined = combine(&[&input, &fuel, &output]);
    let log = ChangeLog::<ItemKind>::new();
    let removals = RemovalCounter::new();
    let _token = combined
        .add_listener(log.listener(), removals.token())
        .expect("every inventory accepts listeners");

    input.set(0, Some(ItemStack::new(15, 1)));
    fuel.set(0, Some(ItemStack::new(263, 8)));
    output.set(1, Some(ItemStack::new(42, 1)));

    assert_eq!(log.slots(), vec![0, 1, 3]);
    assert_eq!(
        log.records()[1],
        ChangeRecord {
            slot: 1,
            previous: None,
            current: Some(ItemStack::new(263, 8)),
            source_slots: 4,
        }
    );
}

#[test]
fn destroying_one_inventory_cascades() {
    let (input, fuel, output) = furnace();
    let combined = combine(&[&input, &fuel, &output]);
    let log = ChangeLog::<ItemKind>::new();
    let removals = RemovalCounter::new();
    combined
        .add_listener(log.listener(), removals.token())
        .expect("every inventory accepts listeners");

    fuel.drop_listeners();

    assert_eq!(removals.count(), 1);
    assert_eq!(input.listener_count(), 0);
    assert_eq!(output.listener_count(), 0);

    input.set(0, Some(ItemStack::new(15, 1)));
    assert!(log.is_empty());
}
