//! Namespaced identifiers and the registries that hand them out.
//!
//! Identifiers are stable string keys (e.g., `mdm:water`) that survive across
//! sessions, so anything persisted or sent over the wire refers to registry
//! objects through them rather than through in-memory references.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default namespace used when an identifier omits an explicit namespace.
pub const DEFAULT_NAMESPACE: &str = "mdm";

/// Error returned when parsing an invalid [`Identifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierError {
    message: String,
}

impl IdentifierError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for IdentifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for IdentifierError {}

/// A namespaced identifier of the form `namespace:path`.
///
/// Ordering is lexical by `(namespace, path)` and is stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier {
    namespace: String,
    path: String,
}

impl Identifier {
    /// Parse an identifier.
    ///
    /// Accepts either:
    /// - `namespace:path`
    /// - `path` (uses [`DEFAULT_NAMESPACE`])
    pub fn parse(input: &str) -> Result<Self, IdentifierError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(IdentifierError::new("Identifier cannot be empty"));
        }

        let (namespace, path) = match input.split_once(':') {
            Some((ns, p)) => (ns, p),
            None => (DEFAULT_NAMESPACE, input),
        };

        Self::new(namespace.trim(), path.trim())
    }

    /// Build an identifier from its two halves, validating both.
    pub fn new(namespace: &str, path: &str) -> Result<Self, IdentifierError> {
        validate_namespace(namespace)?;
        validate_path(path)?;
        Ok(Self {
            namespace: namespace.to_string(),
            path: path.to_string(),
        })
    }

    /// Identifier in the default namespace; `path` must be a valid literal.
    pub(crate) fn builtin(path: &'static str) -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            path: path.to_string(),
        }
    }

    /// Identifier namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Identifier path.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn validate_namespace(ns: &str) -> Result<(), IdentifierError> {
    if ns.is_empty() {
        return Err(IdentifierError::new("Identifier namespace cannot be empty"));
    }
    if ns.len() > 64 {
        return Err(IdentifierError::new(
            "Identifier namespace too long (max 64)",
        ));
    }
    if !ns
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.'))
    {
        return Err(IdentifierError::new(
            "Identifier namespace has invalid characters (allowed: a-z0-9_.-)",
        ));
    }
    Ok(())
}

fn validate_path(path: &str) -> Result<(), IdentifierError> {
    if path.is_empty() {
        return Err(IdentifierError::new("Identifier path cannot be empty"));
    }
    if path.len() > 128 {
        return Err(IdentifierError::new("Identifier path too long (max 128)"));
    }
    if !path
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.' | '/'))
    {
        return Err(IdentifierError::new(
            "Identifier path has invalid characters (allowed: a-z0-9_./-)",
        ));
    }
    Ok(())
}

/// Errors raised while populating registries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The identifier is already taken in this registry.
    #[error("{id} is already registered in {registry}")]
    DuplicateId {
        /// Registry that rejected the entry.
        registry: Identifier,
        /// Conflicting identifier.
        id: Identifier,
    },
    /// The object is already registered under another identifier.
    #[error("object is already registered in {registry} as {existing}")]
    DuplicateObject {
        /// Registry that rejected the entry.
        registry: Identifier,
        /// Identifier the object already holds.
        existing: Identifier,
    },
    /// A registry with this identifier already exists in the root.
    #[error("registry {0} is already present")]
    DuplicateRegistry(Identifier),
}

/// Read-only, type-erased view of a registry.
///
/// Decoding persisted identities only needs to know which identifiers a
/// registry contains, not the objects themselves.
pub trait RegistryView: Send + Sync {
    /// Identifier of the registry itself.
    fn id(&self) -> &Identifier;

    /// Identifier that stands for "nothing" in this registry, if any.
    fn default_id(&self) -> Option<&Identifier>;

    /// Whether an object is registered under `id`.
    fn contains_id(&self, id: &Identifier) -> bool;
}

/// A namespace mapping identifiers to objects and back.
#[derive(Debug, Clone)]
pub struct Registry<T> {
    id: Identifier,
    default_id: Option<Identifier>,
    by_id: BTreeMap<Identifier, T>,
    ids: HashMap<T, Identifier>,
}

impl<T: Clone + Eq + Hash> Registry<T> {
    /// Create an empty registry without a default entry.
    pub fn new(id: Identifier) -> Self {
        Self {
            id,
            default_id: None,
            by_id: BTreeMap::new(),
            ids: HashMap::new(),
        }
    }

    /// Create a registry whose `default_id` entry represents the empty value.
    pub fn defaulted(id: Identifier, default_id: Identifier, default_obj: T) -> Self {
        let mut registry = Self::new(id);
        registry.by_id.insert(default_id.clone(), default_obj.clone());
        registry.ids.insert(default_obj, default_id.clone());
        registry.default_id = Some(default_id);
        registry
    }

    /// Register `obj` under `id`.
    pub fn register(&mut self, id: Identifier, obj: T) -> Result<(), RegistryError> {
        if self.by_id.contains_key(&id) {
            return Err(RegistryError::DuplicateId {
                registry: self.id.clone(),
                id,
            });
        }
        if let Some(existing) = self.ids.get(&obj) {
            return Err(RegistryError::DuplicateObject {
                registry: self.id.clone(),
                existing: existing.clone(),
            });
        }
        self.by_id.insert(id.clone(), obj.clone());
        self.ids.insert(obj, id);
        Ok(())
    }

    /// Look up an object by identifier.
    pub fn get(&self, id: &Identifier) -> Option<&T> {
        self.by_id.get(id)
    }

    /// Resolve the identifier an object is registered under.
    pub fn id_of(&self, obj: &T) -> Option<&Identifier> {
        self.ids.get(obj)
    }

    /// Number of registered objects (including the default entry).
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns true when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Iterate over entries in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&Identifier, &T)> + '_ {
        self.by_id.iter()
    }
}

impl<T: Clone + Eq + Hash + Send + Sync> RegistryView for Registry<T> {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn default_id(&self) -> Option<&Identifier> {
        self.default_id.as_ref()
    }

    fn contains_id(&self, id: &Identifier) -> bool {
        self.by_id.contains_key(id)
    }
}

/// Root table of registries, keyed by registry identifier.
#[derive(Clone, Default)]
pub struct Registries {
    by_id: BTreeMap<Identifier, Arc<dyn RegistryView>>,
}

impl Registries {
    /// Create an empty root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a registry to the root.
    pub fn insert(&mut self, registry: Arc<dyn RegistryView>) -> Result<(), RegistryError> {
        let id = registry.id().clone();
        if self.by_id.contains_key(&id) {
            return Err(RegistryError::DuplicateRegistry(id));
        }
        self.by_id.insert(id, registry);
        Ok(())
    }

    /// Look up a registry by identifier.
    pub fn get(&self, id: &Identifier) -> Option<&dyn RegistryView> {
        self.by_id.get(id).map(|registry| registry.as_ref())
    }

    /// Identifiers of every registry in the root.
    pub fn ids(&self) -> impl Iterator<Item = &Identifier> + '_ {
        self.by_id.keys()
    }
}

impl fmt::Debug for Registries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.by_id.keys()).finish()
    }
}
