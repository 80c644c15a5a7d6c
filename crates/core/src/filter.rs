//! Predicates over resource identity.
//!
//! Filters are immutable values behind an [`Arc`], so cloning and sharing them
//! is cheap and composing two filters never touches either input.

use std::fmt;
use std::sync::Arc;

type Predicate<K> = dyn Fn(&K) -> bool + Send + Sync;

/// A composable predicate over resource keys of type `K`.
pub struct ResourceFilter<K> {
    node: Arc<FilterNode<K>>,
}

enum FilterNode<K> {
    Anything,
    Nothing,
    Exact(K),
    OneOf(Vec<K>),
    Predicate(Box<Predicate<K>>),
    All(Vec<ResourceFilter<K>>),
    Any(Vec<ResourceFilter<K>>),
    Not(ResourceFilter<K>),
}

impl<K> Clone for ResourceFilter<K> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
        }
    }
}

impl<K: PartialEq> ResourceFilter<K> {
    fn from_node(node: FilterNode<K>) -> Self {
        Self {
            node: Arc::new(node),
        }
    }

    /// Accepts every key.
    pub fn anything() -> Self {
        Self::from_node(FilterNode::Anything)
    }

    /// Rejects every key.
    pub fn nothing() -> Self {
        Self::from_node(FilterNode::Nothing)
    }

    /// Accepts only keys equal to `key`.
    pub fn exact(key: K) -> Self {
        Self::from_node(FilterNode::Exact(key))
    }

    /// Accepts keys equal to any of `keys`. An empty list accepts nothing.
    pub fn one_of(keys: impl IntoIterator<Item = K>) -> Self {
        let keys: Vec<K> = keys.into_iter().collect();
        if keys.is_empty() {
            return Self::nothing();
        }
        Self::from_node(FilterNode::OneOf(keys))
    }

    /// Wrap an arbitrary predicate.
    pub fn from_fn(predicate: impl Fn(&K) -> bool + Send + Sync + 'static) -> Self {
        Self::from_node(FilterNode::Predicate(Box::new(predicate)))
    }

    /// Test a key against this filter.
    pub fn matches(&self, key: &K) -> bool {
        match self.node.as_ref() {
            FilterNode::Anything => true,
            FilterNode::Nothing => false,
            FilterNode::Exact(expected) => expected == key,
            FilterNode::OneOf(keys) => keys.contains(key),
            FilterNode::Predicate(predicate) => predicate(key),
            FilterNode::All(filters) => filters.iter().all(|f| f.matches(key)),
            FilterNode::Any(filters) => filters.iter().any(|f| f.matches(key)),
            FilterNode::Not(inner) => !inner.matches(key),
        }
    }

    /// Returns true if this filter accepts every key.
    pub fn is_anything(&self) -> bool {
        matches!(self.node.as_ref(), FilterNode::Anything)
    }

    /// Returns true if this filter rejects every key.
    pub fn is_nothing(&self) -> bool {
        matches!(self.node.as_ref(), FilterNode::Nothing)
    }

    /// Filter accepting a key only if both `self` and `other` accept it.
    ///
    /// Conjunctions are kept flat: `a.and(b).and(c)` is one node with three
    /// children rather than a nested pair.
    pub fn and(&self, other: &Self) -> Self {
        if self.is_anything() || other.is_nothing() {
            return other.clone();
        }
        if other.is_anything() || self.is_nothing() {
            return self.clone();
        }
        let mut parts = Vec::new();
        for filter in [self, other] {
            match filter.node.as_ref() {
                FilterNode::All(children) => parts.extend(children.iter().cloned()),
                _ => parts.push(filter.clone()),
            }
        }
        Self::from_node(FilterNode::All(parts))
    }

    /// Filter accepting a key if either `self` or `other` accepts it.
    pub fn or(&self, other: &Self) -> Self {
        if self.is_nothing() || other.is_anything() {
            return other.clone();
        }
        if other.is_nothing() || self.is_anything() {
            return self.clone();
        }
        let mut parts = Vec::new();
        for filter in [self, other] {
            match filter.node.as_ref() {
                FilterNode::Any(children) => parts.extend(children.iter().cloned()),
                _ => parts.push(filter.clone()),
            }
        }
        Self::from_node(FilterNode::Any(parts))
    }

    /// Filter accepting exactly the keys this one rejects.
    pub fn negate(&self) -> Self {
        match self.node.as_ref() {
            FilterNode::Anything => Self::nothing(),
            FilterNode::Nothing => Self::anything(),
            FilterNode::Not(inner) => inner.clone(),
            _ => Self::from_node(FilterNode::Not(self.clone())),
        }
    }

    /// Nesting depth of composite nodes; leaves are depth 0.
    pub fn depth(&self) -> usize {
        match self.node.as_ref() {
            FilterNode::All(children) | FilterNode::Any(children) => {
                1 + children.iter().map(Self::depth).max().unwrap_or(0)
            }
            FilterNode::Not(inner) => 1 + inner.depth(),
            _ => 0,
        }
    }
}

impl<K: PartialEq> Default for ResourceFilter<K> {
    fn default() -> Self {
        Self::anything()
    }
}

impl<K: fmt::Debug> fmt::Debug for ResourceFilter<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node.as_ref() {
            FilterNode::Anything => f.write_str("Anything"),
            FilterNode::Nothing => f.write_str("Nothing"),
            FilterNode::Exact(key) => f.debug_tuple("Exact").field(key).finish(),
            FilterNode::OneOf(keys) => f.debug_tuple("OneOf").field(keys).finish(),
            FilterNode::Predicate(_) => f.write_str("Predicate(..)"),
            FilterNode::All(children) => f.debug_tuple("All").field(children).finish(),
            FilterNode::Any(children) => f.debug_tuple("Any").field(children).finish(),
            FilterNode::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
        }
    }
}
