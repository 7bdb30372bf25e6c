//! A collection of records keyed by an extracted primary key.
//!
//! Collections own their secondary indexes. Index maintenance is automatic:
//! every insert and remove keeps all indexes in step, and creating an index
//! backfills it from the records already present. A record whose indexed
//! field is absent (or not a scalar) has no entry in that index.

use crate::cursor::{Cursor, Direction};
use crate::key::KeyValue;
use crate::Record;
use std::collections::{BTreeMap, BTreeSet};

/// Entries of one secondary index: `(field value, primary key)` pairs.
///
/// Including the primary key keeps entries unique and gives a stable
/// tie-break when multiple records share a field value.
type IndexEntries = BTreeSet<(KeyValue, KeyValue)>;

/// A named group of records with a key path and secondary indexes.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    /// Field that uniquely identifies a record.
    key_path: String,
    /// Records ordered by primary key.
    records: BTreeMap<KeyValue, Record>,
    /// Secondary indexes by field name.
    indexes: BTreeMap<String, IndexEntries>,
}

impl Collection {
    /// Creates an empty collection keyed by `key_path`.
    #[must_use]
    pub fn new(key_path: impl Into<String>) -> Self {
        Self {
            key_path: key_path.into(),
            records: BTreeMap::new(),
            indexes: BTreeMap::new(),
        }
    }

    /// The field used as the primary key.
    #[must_use]
    pub fn key_path(&self) -> &str {
        &self.key_path
    }

    /// Extracts the primary key from a record, if present and scalar.
    #[must_use]
    pub fn extract_key(&self, record: &Record) -> Option<KeyValue> {
        record.get(&self.key_path).and_then(KeyValue::from_json)
    }

    /// Number of records in the collection.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.records.len() as u64
    }

    /// Looks up a record by primary key.
    #[must_use]
    pub fn get(&self, key: &KeyValue) -> Option<&Record> {
        self.records.get(key)
    }

    /// Upserts a record under `key`, replacing any stored value entirely.
    pub fn insert(&mut self, key: KeyValue, record: Record) {
        if let Some(previous) = self.records.remove(&key) {
            self.unindex(&key, &previous);
        }
        self.index(&key, &record);
        self.records.insert(key, record);
    }

    /// Removes a record by primary key. Absent keys are a no-op.
    pub fn remove(&mut self, key: &KeyValue) {
        if let Some(previous) = self.records.remove(key) {
            self.unindex(key, &previous);
        }
    }

    /// Empties the collection and all of its indexes.
    pub fn clear(&mut self) {
        self.records.clear();
        for entries in self.indexes.values_mut() {
            entries.clear();
        }
    }

    /// Whether an index on `field` exists.
    #[must_use]
    pub fn has_index(&self, field: &str) -> bool {
        self.indexes.contains_key(field)
    }

    /// Names of the declared indexes.
    pub fn index_names(&self) -> impl Iterator<Item = &str> {
        self.indexes.keys().map(String::as_str)
    }

    /// Creates an index on `field` if absent, backfilling it from the
    /// records already stored. Idempotent.
    pub fn create_index(&mut self, field: &str) {
        if self.indexes.contains_key(field) {
            return;
        }
        let mut entries = IndexEntries::new();
        for (key, record) in &self.records {
            if let Some(value) = record.get(field).and_then(KeyValue::from_json) {
                entries.insert((value, key.clone()));
            }
        }
        self.indexes.insert(field.to_string(), entries);
    }

    /// Opens a cursor over the collection in primary-key order.
    #[must_use]
    pub fn cursor(&self, direction: Direction) -> Cursor<'_> {
        Cursor::from_iter(self.records.values(), direction)
    }

    /// Opens a cursor in index order, or `None` if the index is absent.
    ///
    /// Records without a usable value in the indexed field are not visited.
    #[must_use]
    pub fn index_cursor(&self, field: &str, direction: Direction) -> Option<Cursor<'_>> {
        let entries = self.indexes.get(field)?;
        let it = entries
            .iter()
            .filter_map(|(_, key)| self.records.get(key));
        Some(Cursor::from_iter(it, direction))
    }

    /// Adds index entries for a record being stored under `key`.
    fn index(&mut self, key: &KeyValue, record: &Record) {
        for (field, entries) in &mut self.indexes {
            if let Some(value) = record.get(field).and_then(KeyValue::from_json) {
                entries.insert((value, key.clone()));
            }
        }
    }

    /// Drops index entries for a record previously stored under `key`.
    fn unindex(&mut self, key: &KeyValue, record: &Record) {
        for (field, entries) in &mut self.indexes {
            if let Some(value) = record.get(field).and_then(KeyValue::from_json) {
                entries.remove(&(value, key.clone()));
            }
        }
    }
}
