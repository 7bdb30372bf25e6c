//! Declarative store schema: collections, key paths, and index specs.
//!
//! A schema is immutable for the lifetime of a handle. Reconciliation is
//! additive: adapters create whatever the schema declares and is missing,
//! and never touch anything else.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_key_path() -> String {
    "id".to_string()
}

/// Options for a secondary index.
///
/// Currently only the index's existence matters; this stays a struct so
/// options (uniqueness, collation) can be added without reshaping the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {}

/// Declaration of one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSpec {
    /// Field used as the primary key. Defaults to `"id"`.
    #[serde(default = "default_key_path")]
    pub key_path: String,
    /// Indexed fields by name.
    #[serde(default)]
    pub indices: BTreeMap<String, IndexSpec>,
}

impl Default for CollectionSpec {
    fn default() -> Self {
        Self {
            key_path: default_key_path(),
            indices: BTreeMap::new(),
        }
    }
}

impl CollectionSpec {
    /// Creates a spec keyed by `"id"` with no indexes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the primary-key field.
    #[must_use]
    pub fn key_path(mut self, field: impl Into<String>) -> Self {
        self.key_path = field.into();
        self
    }

    /// Declares an index on `field`.
    #[must_use]
    pub fn index(mut self, field: impl Into<String>) -> Self {
        self.indices.insert(field.into(), IndexSpec::default());
        self
    }
}

/// The declared logical schema: collection name to spec.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    collections: BTreeMap<String, CollectionSpec>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a collection.
    #[must_use]
    pub fn collection(mut self, name: impl Into<String>, spec: CollectionSpec) -> Self {
        self.collections.insert(name.into(), spec);
        self
    }

    /// Iterates declared collections in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CollectionSpec)> {
        self.collections.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// Declared collection names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    /// Looks up a collection's spec.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CollectionSpec> {
        self.collections.get(name)
    }

    /// Whether the schema declares an index on `field` of `collection`.
    #[must_use]
    pub fn has_index(&self, collection: &str, field: &str) -> bool {
        self.collections
            .get(collection)
            .is_some_and(|spec| spec.indices.contains_key(field))
    }
}

/// Whether `name` is safe to splice into SQL and file names: ASCII
/// alphanumerics and underscores, not starting with a digit.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
