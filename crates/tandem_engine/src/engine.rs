//! The engine: a registry of named databases.

use crate::database::{Database, UpgradeTxn};
use crate::error::EngineResult;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// The native engine, owning every named database in the process.
///
/// This is the explicit capability value handed to store constructors -
/// there is no ambient global registry. Clones share the same databases.
///
/// # Example
///
/// ```rust
/// use tandem_engine::Engine;
///
/// let engine = Engine::new();
/// let db = engine.open("app", 1, |upgrade| {
///     upgrade.create_collection("notes", "id");
///     Ok(())
/// }).unwrap();
/// assert_eq!(db.version(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Engine {
    databases: Arc<RwLock<HashMap<String, Arc<Database>>>>,
}

impl Engine {
    /// Creates an engine with no databases.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the named database at `version`, creating it if absent.
    ///
    /// When the stored version is below `version`, the `upgrade` unit runs
    /// atomically before the handle is returned; when equal, the handle is
    /// returned as-is. Concurrent opens of the same name collapse onto one
    /// upgrade - the version check makes the losers no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::VersionConflict`](crate::EngineError::VersionConflict)
    /// when `version` is below the stored version, or whatever error the
    /// upgrade unit produced (the database is rolled back in that case).
    pub fn open<F>(&self, name: &str, version: u32, upgrade: F) -> EngineResult<Arc<Database>>
    where
        F: FnOnce(&mut UpgradeTxn<'_>) -> EngineResult<()>,
    {
        let db = {
            let mut databases = self.databases.write();
            Arc::clone(
                databases
                    .entry(name.to_string())
                    .or_insert_with(|| Arc::new(Database::new())),
            )
        };
        db.upgrade(name, version, upgrade)?;
        Ok(db)
    }

    /// Destroys the named database and everything in it.
    ///
    /// Unknown names are a no-op. Handles already returned by [`open`]
    /// keep their (now detached) data alive until dropped.
    ///
    /// [`open`]: Engine::open
    pub fn delete(&self, name: &str) {
        self.databases.write().remove(name);
    }

    /// Whether the named database exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.databases.read().contains_key(name)
    }
}
