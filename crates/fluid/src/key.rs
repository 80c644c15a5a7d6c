//! Fluid identities and their persisted forms.
//!
//! Most fluids are registry entries. A floating key names a fluid by
//! identifier alone, for content that is not backed by any registry.

use std::fmt;

use mdattrs_core::entry::{fluid_registry_id, KEY_OBJ_IDENTIFIER, KEY_REGISTRY_TYPE};
use mdattrs_core::{
    EntryError, Identifier, PacketReader, PacketWriter, Registries, Registry, RegistryEntry,
    WireError,
};
use serde_json::{Map, Value};

use crate::registries::{Fluid, Potion};

/// Wire tag byte for a floating key.
pub const WIRE_TAG_FLOATING: u8 = 0;

/// The identity behind a [`FluidKey`].
///
/// Keys of different variants never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FluidEntry {
    /// An object from a registry (fluids, potions, or any other).
    Registry(RegistryEntry),
    /// A fluid known only by identifier.
    Floating(Identifier),
}

/// Identity of a fluid, independent of any amount.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FluidKey {
    entry: FluidEntry,
}

impl FluidKey {
    /// Key for a registered fluid.
    pub fn from_fluid(fluids: &Registry<Fluid>, fluid: &Fluid) -> Result<Self, EntryError> {
        RegistryEntry::new(fluids, fluid).map(Self::from_entry)
    }

    /// Key for a registered potion.
    pub fn from_potion(potions: &Registry<Potion>, potion: &Potion) -> Result<Self, EntryError> {
        RegistryEntry::new(potions, potion).map(Self::from_entry)
    }

    /// Key for the object registered as `id` in the registry `registry`.
    pub fn from_id(
        registries: &Registries,
        registry: &Identifier,
        id: Identifier,
    ) -> Result<Self, EntryError> {
        let view = registries
            .get(registry)
            .ok_or_else(|| EntryError::UnknownRegistry(registry.to_string()))?;
        RegistryEntry::from_id(view, id).map(Self::from_entry)
    }

    /// Wrap an existing registry entry.
    pub fn from_entry(entry: RegistryEntry) -> Self {
        Self {
            entry: FluidEntry::Registry(entry),
        }
    }

    /// Key naming a fluid by identifier only.
    pub fn floating(id: Identifier) -> Self {
        Self {
            entry: FluidEntry::Floating(id),
        }
    }

    /// The fluid registry's default entry.
    ///
    /// Fails with [`EntryError::MissingField`] when the fluid registry has no
    /// default, since an empty tag then names nothing.
    pub fn empty(registries: &Registries) -> Result<Self, EntryError> {
        let fluid_registry = fluid_registry_id();
        let view = registries
            .get(&fluid_registry)
            .ok_or_else(|| EntryError::UnknownRegistry(fluid_registry.to_string()))?;
        RegistryEntry::default_of(view)
            .map(Self::from_entry)
            .ok_or(EntryError::MissingField(KEY_OBJ_IDENTIFIER))
    }

    /// The underlying identity.
    pub fn entry(&self) -> &FluidEntry {
        &self.entry
    }

    /// Object identifier, whatever the variant.
    pub fn id(&self) -> &Identifier {
        match &self.entry {
            FluidEntry::Registry(entry) => entry.id(),
            FluidEntry::Floating(id) => id,
        }
    }

    /// Whether this is a registry's default entry. Floating keys are never empty.
    pub fn is_empty(&self) -> bool {
        match &self.entry {
            FluidEntry::Registry(entry) => entry.is_empty(),
            FluidEntry::Floating(_) => false,
        }
    }

    /// Write this key's fields into `tag`.
    ///
    /// Floating keys write only the object name; empty keys write nothing.
    pub fn to_tag(&self, tag: &mut Map<String, Value>) {
        match &self.entry {
            FluidEntry::Registry(entry) => entry.to_tag(tag),
            FluidEntry::Floating(id) => {
                tag.insert(KEY_OBJ_IDENTIFIER.to_string(), Value::String(id.to_string()));
            }
        }
    }

    /// Read a key written by [`to_tag`](Self::to_tag).
    ///
    /// A tag with neither field decodes to the fluid registry's default.
    pub fn from_tag(tag: &Map<String, Value>, registries: &Registries) -> Result<Self, EntryError> {
        if !tag.contains_key(KEY_REGISTRY_TYPE) {
            if let Some(name) = tag.get(KEY_OBJ_IDENTIFIER) {
                let name = name
                    .as_str()
                    .ok_or(EntryError::NotAString(KEY_OBJ_IDENTIFIER))?;
                return Ok(Self::floating(Identifier::parse(name)?));
            }
        }
        match RegistryEntry::from_tag(tag, registries)? {
            Some(entry) => Ok(Self::from_entry(entry)),
            None => Self::empty(registries),
        }
    }

    /// Write this key in wire form.
    pub fn to_wire(&self, buf: &mut PacketWriter) -> Result<(), WireError> {
        match &self.entry {
            FluidEntry::Registry(entry) => entry.to_wire(buf),
            FluidEntry::Floating(id) => {
                buf.write_u8(WIRE_TAG_FLOATING)?;
                buf.write_identifier(id)
            }
        }
    }

    /// Read a key written by [`to_wire`](Self::to_wire).
    pub fn from_wire(buf: &mut PacketReader<'_>, registries: &Registries) -> Result<Self, EntryError> {
        if buf.peek_u8()? == WIRE_TAG_FLOATING {
            buf.read_u8()?;
            return Ok(Self::floating(buf.read_identifier()?));
        }
        RegistryEntry::from_wire(buf, registries).map(Self::from_entry)
    }
}

impl fmt::Display for FluidKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.id(), f)
    }
}
