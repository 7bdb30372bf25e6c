//! Engine adapters: one contract, two backends.
//!
//! Each adapter owns its connection state and translates the contract
//! operations into backend-native calls. Selection happens at handle
//! construction via [`Backend`](crate::Backend); dispatch goes through
//! the [`Connection`] enum rather than trait objects, since the adapter
//! set is closed.

pub(crate) mod native;
pub(crate) mod sqlite;

use crate::error::StoreResult;
use crate::query::{Query, QueryResult};
use crate::{KeyValue, Record};

pub(crate) use native::NativeConnection;
pub(crate) use sqlite::SqliteConnection;

/// The uniform contract both engine adapters implement.
///
/// Every method runs inside its own atomic unit against the shared
/// connection and settles exactly once.
pub(crate) trait EngineAdapter {
    /// Upserts a batch of records by primary key, atomically.
    async fn put(&self, collection: &str, records: Vec<Record>) -> StoreResult<()>;

    /// Fetches a record by primary key; absent keys resolve with `None`.
    async fn get(&self, collection: &str, key: KeyValue) -> StoreResult<Option<Record>>;

    /// Deletes records by primary key; absent keys are ignored.
    async fn remove(&self, collection: &str, keys: Vec<KeyValue>) -> StoreResult<()>;

    /// Empties the named collections; unknown names are ignored.
    async fn clear(&self, names: Vec<String>) -> StoreResult<()>;

    /// Runs the paginated/ordered query algorithm.
    async fn query(&self, collection: &str, query: &Query) -> StoreResult<QueryResult>;
}

/// An open, shared connection to the selected backend.
///
/// Cheap to clone; clones share the underlying engine connection.
#[derive(Debug, Clone)]
pub(crate) struct Connection {
    inner: Inner,
}

#[derive(Debug, Clone)]
enum Inner {
    Native(NativeConnection),
    Sqlite(SqliteConnection),
}

impl Connection {
    pub(crate) fn native(conn: NativeConnection) -> Self {
        Self {
            inner: Inner::Native(conn),
        }
    }

    pub(crate) fn sqlite(conn: SqliteConnection) -> Self {
        Self {
            inner: Inner::Sqlite(conn),
        }
    }

    pub(crate) async fn put(&self, collection: &str, records: Vec<Record>) -> StoreResult<()> {
        match &self.inner {
            Inner::Native(c) => c.put(collection, records).await,
            Inner::Sqlite(c) => c.put(collection, records).await,
        }
    }

    pub(crate) async fn get(
        &self,
        collection: &str,
        key: KeyValue,
    ) -> StoreResult<Option<Record>> {
        match &self.inner {
            Inner::Native(c) => c.get(collection, key).await,
            Inner::Sqlite(c) => c.get(collection, key).await,
        }
    }

    pub(crate) async fn remove(&self, collection: &str, keys: Vec<KeyValue>) -> StoreResult<()> {
        match &self.inner {
            Inner::Native(c) => c.remove(collection, keys).await,
            Inner::Sqlite(c) => c.remove(collection, keys).await,
        }
    }

    pub(crate) async fn clear(&self, names: Vec<String>) -> StoreResult<()> {
        match &self.inner {
            Inner::Native(c) => c.clear(names).await,
            Inner::Sqlite(c) => c.clear(names).await,
        }
    }

    pub(crate) async fn query(
        &self,
        collection: &str,
        query: &Query,
    ) -> StoreResult<QueryResult> {
        match &self.inner {
            Inner::Native(c) => c.query(collection, query).await,
            Inner::Sqlite(c) => c.query(collection, query).await,
        }
    }

    /// Releases backend resources. A no-op for both current backends:
    /// the native engine has nothing to release and the SQLite file
    /// handle closes when the last clone drops.
    pub(crate) async fn close(&self) -> StoreResult<()> {
        Ok(())
    }
}
