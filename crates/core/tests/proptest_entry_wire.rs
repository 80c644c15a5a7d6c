//! Fuzz-style property tests for registry entry decoding
//!
//! Decoders must reject arbitrary input with an error instead of panicking,
//! and well-formed entries must survive a trip through both encodings.

use std::sync::Arc;

use mdattrs_core::entry::{fluid_registry_id, potion_registry_id};
use mdattrs_core::{
    Identifier, PacketReader, PacketWriter, Registries, Registry, RegistryEntry,
};
use proptest::prelude::*;
use serde_json::{Map, Value};

fn registries(paths: &[String]) -> (Registries, Vec<Registry<String>>) {
    let mut fluids = Registry::defaulted(
        fluid_registry_id(),
        Identifier::parse("mdm:empty").unwrap(),
        "empty".to_string(),
    );
    let mut potions = Registry::new(potion_registry_id());
    let mut custom = Registry::new(Identifier::parse("ext:custom").unwrap());
    for path in paths {
        let id = Identifier::new("mdm", &format!("p_{path}")).unwrap();
        let _ = fluids.register(id.clone(), format!("fluid/{path}"));
        let _ = potions.register(id.clone(), format!("potion/{path}"));
        let _ = custom.register(id, format!("custom/{path}"));
    }
    let mut root = Registries::new();
    root.insert(Arc::new(fluids.clone())).unwrap();
    root.insert(Arc::new(potions.clone())).unwrap();
    root.insert(Arc::new(custom.clone())).unwrap();
    (root, vec![fluids, potions, custom])
}

proptest! {
    /// Property: Arbitrary bytes don't crash the wire decoder
    #[test]
    fn arbitrary_bytes_dont_crash_decoder(
        random_bytes in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let (root, _) = registries(&["water".to_string()]);
        let mut reader = PacketReader::new(&random_bytes);
        let _result = RegistryEntry::from_wire(&mut reader, &root);
        // No panic = success
    }

    /// Property: Arbitrary string tags don't crash the tag decoder
    #[test]
    fn arbitrary_tags_dont_crash_decoder(
        registry in "[a-z:]{0,12}",
        name in "[a-zA-Z:_/]{0,16}",
    ) {
        let (root, _) = registries(&["water".to_string()]);
        let mut tag = Map::new();
        tag.insert("Registry".to_string(), Value::String(registry));
        tag.insert("ObjName".to_string(), Value::String(name));
        let _result = RegistryEntry::from_tag(&tag, &root);
    }

    /// Property: Registered entries survive both encodings in every registry
    #[test]
    fn registered_entries_roundtrip(
        paths in prop::collection::btree_set("[a-z][a-z0-9_]{0,10}", 1..8),
        pick in any::<prop::sample::Index>(),
        which in 0usize..3,
    ) {
        let paths: Vec<String> = paths.into_iter().collect();
        let (root, backing) = registries(&paths);
        let path = pick.get(&paths);
        let prefix = ["fluid", "potion", "custom"][which];
        let entry = RegistryEntry::new(&backing[which], &format!("{prefix}/{path}")).unwrap();

        let mut buf = PacketWriter::new();
        entry.to_wire(&mut buf).unwrap();
        let mut reader = PacketReader::new(buf.as_bytes());
        let decoded = RegistryEntry::from_wire(&mut reader, &root).unwrap();
        prop_assert_eq!(&decoded, &entry);
        prop_assert_eq!(reader.remaining(), 0);

        let mut tag = Map::new();
        entry.to_tag(&mut tag);
        let from_tag = RegistryEntry::from_tag(&tag, &root).unwrap();
        prop_assert_eq!(from_tag, Some(entry));
    }
}
