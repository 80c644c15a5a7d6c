//! Registry-backed identities.
//!
//! A [`RegistryEntry`] names an object by `(registry id, object id)`. Both
//! halves are stable strings, so equality and hashing behave the same in
//! every session and after a save/load or network round trip.
//!
//! Persisted tags use short codes for the two most common registries
//! (`"f"` for fluids, `"p"` for potions) and the full registry identifier for
//! everything else. The wire format selects the registry with a tag byte:
//! `1` fluids, `2` potions, `3` followed by an explicit registry identifier.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::registry::{Identifier, IdentifierError, Registries, Registry, RegistryView};
use crate::wire::{PacketReader, PacketWriter, WireError};

/// Tag key holding the registry code.
pub const KEY_REGISTRY_TYPE: &str = "Registry";
/// Tag key holding the object identifier.
pub const KEY_OBJ_IDENTIFIER: &str = "ObjName";

/// Persisted code for the fluid registry.
pub const FLUID_REGISTRY_CODE: &str = "f";
/// Persisted code for the potion registry.
pub const POTION_REGISTRY_CODE: &str = "p";

/// Wire tag selecting the fluid registry.
pub const WIRE_TAG_FLUID: u8 = 1;
/// Wire tag selecting the potion registry.
pub const WIRE_TAG_POTION: u8 = 2;
/// Wire tag announcing an explicit registry identifier.
pub const WIRE_TAG_EXPLICIT: u8 = 3;

/// Identifier of the well-known fluid registry (`mdm:fluid`).
pub fn fluid_registry_id() -> Identifier {
    Identifier::builtin("fluid")
}

/// Identifier of the well-known potion registry (`mdm:potion`).
pub fn potion_registry_id() -> Identifier {
    Identifier::builtin("potion")
}

/// Errors raised while building or decoding a [`RegistryEntry`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryError {
    /// The object has no identifier in the registry it was paired with.
    #[error("{object} is not registered with {registry}")]
    Unregistered {
        /// Registry that was searched.
        registry: Identifier,
        /// Debug rendering of the object.
        object: String,
    },
    /// A tag or packet referenced a registry missing from the root.
    #[error("unknown registry {0}")]
    UnknownRegistry(String),
    /// A tag or packet named an object the registry does not contain and the
    /// registry has no default to fall back to.
    #[error("{id} is not registered with {registry}")]
    UnknownObject {
        /// Registry that was searched.
        registry: Identifier,
        /// Identifier that was not found.
        id: Identifier,
    },
    /// A tag carried one of the two fields without the other.
    #[error("tag is missing field {0}")]
    MissingField(&'static str),
    /// A tag field was present but not a string.
    #[error("tag field {0} is not a string")]
    NotAString(&'static str),
    /// A tag field held a malformed identifier.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdentifierError),
    /// Wire decoding failed.
    #[error(transparent)]
    Wire(#[from] WireError),
}

/// Identity of an object drawn from a [`Registry`].
///
/// Equality and hashing consider only the registry identifier and the object
/// identifier; the registry's default id is carried along for
/// [`is_empty`](Self::is_empty) and tag omission.
#[derive(Clone)]
pub struct RegistryEntry {
    registry: Identifier,
    id: Identifier,
    default_id: Option<Identifier>,
}

impl RegistryEntry {
    /// Identity of `obj` in `registry`.
    pub fn new<T>(registry: &Registry<T>, obj: &T) -> Result<Self, EntryError>
    where
        T: Clone + Eq + std::hash::Hash + Send + Sync + fmt::Debug,
    {
        let id = registry
            .id_of(obj)
            .ok_or_else(|| EntryError::Unregistered {
                registry: registry.id().clone(),
                object: format!("{obj:?}"),
            })?
            .clone();
        Ok(Self::from_parts(registry, id))
    }

    /// Identity of the object registered under `id`.
    pub fn from_id(registry: &dyn RegistryView, id: Identifier) -> Result<Self, EntryError> {
        if !registry.contains_id(&id) {
            return Err(EntryError::UnknownObject {
                registry: registry.id().clone(),
                id,
            });
        }
        Ok(Self::from_parts(registry, id))
    }

    /// The entry representing "nothing" in `registry`, if it defines one.
    pub fn default_of(registry: &dyn RegistryView) -> Option<Self> {
        let id = registry.default_id()?.clone();
        Some(Self::from_parts(registry, id))
    }

    fn from_parts(registry: &dyn RegistryView, id: Identifier) -> Self {
        Self {
            registry: registry.id().clone(),
            id,
            default_id: registry.default_id().cloned(),
        }
    }

    /// Identifier of the backing registry.
    pub fn registry_id(&self) -> &Identifier {
        &self.registry
    }

    /// Identifier of the object within its registry.
    pub fn id(&self) -> &Identifier {
        &self.id
    }

    /// Whether this entry is the registry's default ("empty") object.
    pub fn is_empty(&self) -> bool {
        self.default_id.as_ref() == Some(&self.id)
    }

    /// Short name used in persisted tags: `"f"`, `"p"`, or the full registry id.
    pub fn registry_code(&self) -> String {
        if self.registry == fluid_registry_id() {
            FLUID_REGISTRY_CODE.to_string()
        } else if self.registry == potion_registry_id() {
            POTION_REGISTRY_CODE.to_string()
        } else {
            self.registry.to_string()
        }
    }

    /// Session-independent 64-bit hash of `(registry id, object id)`.
    pub fn stable_hash(&self) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.registry.to_string().as_bytes());
        hasher.update(&[0]);
        hasher.update(self.id.to_string().as_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    /// Write this entry's fields into `tag`. Default entries write nothing.
    pub fn to_tag(&self, tag: &mut Map<String, Value>) {
        if self.is_empty() {
            return;
        }
        tag.insert(
            KEY_REGISTRY_TYPE.to_string(),
            Value::String(self.registry_code()),
        );
        tag.insert(
            KEY_OBJ_IDENTIFIER.to_string(),
            Value::String(self.id.to_string()),
        );
    }

    /// Read an entry written by [`to_tag`](Self::to_tag).
    ///
    /// Returns `Ok(None)` when neither field is present, which is how default
    /// entries are persisted; the caller decides which registry's default
    /// that stands for.
    pub fn from_tag(
        tag: &Map<String, Value>,
        registries: &Registries,
    ) -> Result<Option<Self>, EntryError> {
        let code = tag_string(tag, KEY_REGISTRY_TYPE)?;
        let name = tag_string(tag, KEY_OBJ_IDENTIFIER)?;
        let (code, name) = match (code, name) {
            (None, None) => return Ok(None),
            (Some(code), Some(name)) => (code, name),
            (None, Some(_)) => return Err(EntryError::MissingField(KEY_REGISTRY_TYPE)),
            (Some(_), None) => return Err(EntryError::MissingField(KEY_OBJ_IDENTIFIER)),
        };
        let registry = registry_from_code(code, registries)?;
        let id = Identifier::parse(name)?;
        resolve(registry, id).map(Some)
    }

    /// Write this entry in wire form.
    pub fn to_wire(&self, buf: &mut PacketWriter) -> Result<(), WireError> {
        if self.registry == fluid_registry_id() {
            buf.write_u8(WIRE_TAG_FLUID)?;
        } else if self.registry == potion_registry_id() {
            buf.write_u8(WIRE_TAG_POTION)?;
        } else {
            buf.write_u8(WIRE_TAG_EXPLICIT)?;
            buf.write_identifier(&self.registry)?;
        }
        buf.write_identifier(&self.id)
    }

    /// Read an entry written by [`to_wire`](Self::to_wire).
    pub fn from_wire(buf: &mut PacketReader<'_>, registries: &Registries) -> Result<Self, EntryError> {
        let registry_id = match buf.read_u8()? {
            WIRE_TAG_FLUID => fluid_registry_id(),
            WIRE_TAG_POTION => potion_registry_id(),
            WIRE_TAG_EXPLICIT => buf.read_identifier()?,
            other => return Err(WireError::UnknownTag(other).into()),
        };
        let registry = registries
            .get(&registry_id)
            .ok_or_else(|| EntryError::UnknownRegistry(registry_id.to_string()))?;
        let id = buf.read_identifier()?;
        resolve(registry, id)
    }
}

/// Resolve a persisted registry code back to a registry.
pub fn registry_from_code<'r>(
    code: &str,
    registries: &'r Registries,
) -> Result<&'r dyn RegistryView, EntryError> {
    let registry_id = match code {
        FLUID_REGISTRY_CODE => fluid_registry_id(),
        POTION_REGISTRY_CODE => potion_registry_id(),
        other => Identifier::parse(other)
            .map_err(|_| EntryError::UnknownRegistry(other.to_string()))?,
    };
    registries
        .get(&registry_id)
        .ok_or_else(|| EntryError::UnknownRegistry(code.to_string()))
}

// Unknown objects in a defaulted registry decay to the default entry so that
// data saved with content that has since been removed still loads.
fn resolve(registry: &dyn RegistryView, id: Identifier) -> Result<RegistryEntry, EntryError> {
    if registry.contains_id(&id) {
        return Ok(RegistryEntry::from_parts(registry, id));
    }
    match RegistryEntry::default_of(registry) {
        Some(default) => {
            warn!(
                registry = %registry.id(),
                %id,
                "unknown registry object, substituting default"
            );
            Ok(default)
        }
        None => Err(EntryError::UnknownObject {
            registry: registry.id().clone(),
            id,
        }),
    }
}

fn tag_string<'t>(
    tag: &'t Map<String, Value>,
    key: &'static str,
) -> Result<Option<&'t str>, EntryError> {
    match tag.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(EntryError::NotAString(key)),
    }
}

impl PartialEq for RegistryEntry {
    fn eq(&self, other: &Self) -> bool {
        self.registry == other.registry && self.id == other.id
    }
}

impl Eq for RegistryEntry {}

impl Hash for RegistryEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.registry.hash(state);
        self.id.hash(state);
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{RegistryEntry {} {}}}", self.registry_code(), self.id)
    }
}

impl fmt::Display for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.id, f)
    }
}
