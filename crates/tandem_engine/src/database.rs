//! A named database: versioned upgrades and atomic read/write units.

use crate::collection::Collection;
use crate::error::{EngineError, EngineResult};
use crate::key::KeyValue;
use crate::Record;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Versioned database contents guarded by one lock.
#[derive(Debug, Default)]
struct State {
    version: u32,
    collections: BTreeMap<String, Collection>,
}

/// A named database holding collections.
///
/// All access goes through atomic units: [`Database::read`],
/// [`Database::write`], and the upgrade unit run by
/// [`Engine::open`](crate::Engine::open). Units are serialized against each
/// other by the database's lock; a failed write or upgrade unit leaves the
/// database exactly as it was.
#[derive(Debug, Default)]
pub struct Database {
    state: RwLock<State>,
}

impl Database {
    /// Creates an empty database at version 0 (never opened).
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The currently stored version.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.state.read().version
    }

    /// Runs an upgrade unit if `requested` exceeds the stored version.
    ///
    /// The unit sees the collections as they are and may create structures
    /// through [`UpgradeTxn`]. On failure the database rolls back and the
    /// error propagates; opening with a version lower than the stored one
    /// fails with [`EngineError::VersionConflict`].
    pub(crate) fn upgrade<F>(&self, name: &str, requested: u32, f: F) -> EngineResult<()>
    where
        F: FnOnce(&mut UpgradeTxn<'_>) -> EngineResult<()>,
    {
        let mut state = self.state.write();
        if state.version > requested {
            return Err(EngineError::VersionConflict {
                name: name.to_string(),
                stored: state.version,
                requested,
            });
        }
        if state.version == requested && requested != 0 {
            return Ok(());
        }

        let snapshot = state.collections.clone();
        let old_version = state.version;
        let mut txn = UpgradeTxn {
            old_version,
            collections: &mut state.collections,
        };
        match f(&mut txn) {
            Ok(()) => {
                state.version = requested;
                Ok(())
            }
            Err(e) => {
                state.collections = snapshot;
                Err(e)
            }
        }
    }

    /// Runs a read unit against a consistent view of the database.
    pub fn read<R, F>(&self, f: F) -> EngineResult<R>
    where
        F: FnOnce(&ReadTxn<'_>) -> EngineResult<R>,
    {
        let state = self.state.read();
        f(&ReadTxn {
            collections: &state.collections,
        })
    }

    /// Runs a write unit with all-or-nothing visibility.
    ///
    /// If the unit returns an error, every mutation it performed is rolled
    /// back before the error propagates.
    pub fn write<R, F>(&self, f: F) -> EngineResult<R>
    where
        F: FnOnce(&mut WriteTxn<'_>) -> EngineResult<R>,
    {
        let mut state = self.state.write();
        let snapshot = state.collections.clone();
        let mut txn = WriteTxn {
            collections: &mut state.collections,
        };
        match f(&mut txn) {
            Ok(value) => Ok(value),
            Err(e) => {
                state.collections = snapshot;
                Err(e)
            }
        }
    }
}

/// Structural operations available during a version upgrade.
#[derive(Debug)]
pub struct UpgradeTxn<'a> {
    old_version: u32,
    collections: &'a mut BTreeMap<String, Collection>,
}

impl UpgradeTxn<'_> {
    /// The version the database held before this upgrade.
    #[must_use]
    pub fn old_version(&self) -> u32 {
        self.old_version
    }

    /// Whether the named collection exists.
    #[must_use]
    pub fn contains_collection(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    /// Creates a collection keyed by `key_path` if it does not exist.
    /// Existing collections are left untouched, key path included.
    pub fn create_collection(&mut self, name: &str, key_path: &str) {
        self.collections
            .entry(name.to_string())
            .or_insert_with(|| Collection::new(key_path));
    }

    /// Creates an index on an existing collection, backfilling it from the
    /// records already stored. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CollectionNotFound`] if the collection is
    /// absent.
    pub fn create_index(&mut self, collection: &str, field: &str) -> EngineResult<()> {
        let c = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| EngineError::collection_not_found(collection))?;
        c.create_index(field);
        Ok(())
    }

    /// Whether the named collection has an index on `field`.
    #[must_use]
    pub fn has_index(&self, collection: &str, field: &str) -> bool {
        self.collections
            .get(collection)
            .is_some_and(|c| c.has_index(field))
    }
}

/// A consistent read-only view of the database.
#[derive(Debug)]
pub struct ReadTxn<'a> {
    collections: &'a BTreeMap<String, Collection>,
}

impl ReadTxn<'_> {
    /// Whether the named collection exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    /// Borrows the named collection, if present.
    #[must_use]
    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }
}

/// A write unit over the database.
#[derive(Debug)]
pub struct WriteTxn<'a> {
    collections: &'a mut BTreeMap<String, Collection>,
}

impl WriteTxn<'_> {
    /// Whether the named collection exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    /// Upserts a batch of records by their extracted primary keys.
    ///
    /// Keys are extracted and validated for the whole batch before any
    /// record is stored, so a bad record leaves the collection untouched.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CollectionNotFound`] for an absent collection
    /// and [`EngineError::MissingKey`] when a record has no usable key.
    pub fn put_all(&mut self, collection: &str, records: Vec<Record>) -> EngineResult<()> {
        let c = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| EngineError::collection_not_found(collection))?;

        let mut keyed = Vec::with_capacity(records.len());
        for record in records {
            let key = c
                .extract_key(&record)
                .ok_or_else(|| EngineError::missing_key(collection, c.key_path()))?;
            keyed.push((key, record));
        }
        for (key, record) in keyed {
            c.insert(key, record);
        }
        Ok(())
    }

    /// Deletes records by primary key. Absent keys are silently ignored.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CollectionNotFound`] for an absent collection.
    pub fn remove_all(&mut self, collection: &str, keys: &[KeyValue]) -> EngineResult<()> {
        let c = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| EngineError::collection_not_found(collection))?;
        for key in keys {
            c.remove(key);
        }
        Ok(())
    }

    /// Empties each named collection that exists; unknown names are skipped.
    pub fn clear(&mut self, names: &[String]) {
        for name in names {
            if let Some(c) = self.collections.get_mut(name) {
                c.clear();
            }
        }
    }
}
