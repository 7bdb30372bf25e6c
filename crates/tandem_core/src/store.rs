//! The user-facing store handle.
//!
//! A [`Store`] is cheap to clone and lazy: the backend connection is
//! established by the first operation and memoized, success or failure.
//! A failed open is fatal to the handle and every later operation
//! resurfaces the same [`ConnectionError`]; a fresh handle is required
//! to retry.

use crate::adapter::{sqlite, Connection, NativeConnection, SqliteConnection};
use crate::backend::Backend;
use crate::error::{ConnectionError, StoreError, StoreResult};
use crate::query::{Query, QueryResult};
use crate::schema::{is_identifier, Schema};
use crate::{KeyValue, Record};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

/// A handle to one named, versioned, schema-bearing document store.
#[derive(Debug, Clone)]
pub struct Store {
    backend: Backend,
    name: String,
    version: u32,
    schema: Arc<Schema>,
    conn: Arc<OnceCell<Result<Connection, ConnectionError>>>,
}

impl Store {
    /// Creates a handle. No backend work happens until the first
    /// operation.
    pub fn new(backend: Backend, name: impl Into<String>, version: u32, schema: Schema) -> Self {
        Self {
            backend,
            name: name.into(),
            version,
            schema: Arc::new(schema),
            conn: Arc::new(OnceCell::new()),
        }
    }

    /// The store's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The schema version this handle opens at.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// The declared schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the memoized connection, opening it on first use.
    async fn connection(&self) -> StoreResult<Connection> {
        let result = self
            .conn
            .get_or_init(|| async {
                debug!(name = %self.name, version = self.version, "opening store");
                self.connect().await
            })
            .await;
        result.clone().map_err(StoreError::from)
    }

    async fn connect(&self) -> Result<Connection, ConnectionError> {
        if !is_identifier(&self.name) {
            return Err(ConnectionError::new(format!(
                "store name '{}' is not a valid identifier",
                self.name
            )));
        }
        if self.version == 0 {
            return Err(ConnectionError::new("store version must be at least 1"));
        }

        match &self.backend {
            Backend::Native(engine) => {
                let conn =
                    NativeConnection::open(engine, &self.name, self.version, self.schema.clone())?;
                Ok(Connection::native(conn))
            }
            Backend::Sqlite { dir } => {
                let conn = SqliteConnection::open(dir, &self.name, self.schema.clone()).await?;
                Ok(Connection::sqlite(conn))
            }
        }
    }

    /// Eagerly establishes the connection instead of waiting for the
    /// first operation. Settles with the memoized outcome on every call.
    pub async fn open(&self) -> StoreResult<()> {
        self.connection().await.map(|_| ())
    }

    /// Upserts one record into `collection` by its key-path field.
    pub async fn put(&self, collection: &str, record: Record) -> StoreResult<()> {
        self.put_many(collection, vec![record]).await
    }

    /// Upserts a batch of records atomically. If any record lacks a
    /// usable key, nothing is written.
    pub async fn put_many(&self, collection: &str, records: Vec<Record>) -> StoreResult<()> {
        self.connection().await?.put(collection, records).await
    }

    /// Fetches a record by primary key. Absent keys resolve with `None`.
    pub async fn get(
        &self,
        collection: &str,
        key: impl Into<KeyValue>,
    ) -> StoreResult<Option<Record>> {
        self.connection().await?.get(collection, key.into()).await
    }

    /// Deletes a record by primary key. Absent keys are ignored.
    pub async fn remove(&self, collection: &str, key: impl Into<KeyValue>) -> StoreResult<()> {
        self.remove_many(collection, vec![key.into()]).await
    }

    /// Deletes a batch of records by primary key in one atomic unit.
    pub async fn remove_many(&self, collection: &str, keys: Vec<KeyValue>) -> StoreResult<()> {
        self.connection().await?.remove(collection, keys).await
    }

    /// Empties one collection. Unknown names are ignored.
    pub async fn clear(&self, collection: &str) -> StoreResult<()> {
        self.clear_many(vec![collection.to_string()]).await
    }

    /// Empties the named collections in one atomic unit. Unknown names
    /// are ignored.
    pub async fn clear_many(&self, names: Vec<String>) -> StoreResult<()> {
        debug!(name = %self.name, collections = names.len(), "clearing collections");
        self.connection().await?.clear(names).await
    }

    /// Empties every declared collection in one atomic unit.
    pub async fn clear_all(&self) -> StoreResult<()> {
        let names = self.schema.names().map(str::to_string).collect();
        self.clear_many(names).await
    }

    /// Runs a paginated, optionally ordered query over `collection`.
    ///
    /// Unknown collections resolve with an empty result; `total_entries`
    /// always counts the whole collection, not the returned page.
    pub async fn query(&self, collection: &str, query: &Query) -> StoreResult<QueryResult> {
        self.connection().await?.query(collection, query).await
    }

    /// Releases the handle's backend resources, if any were acquired.
    pub async fn close(&self) -> StoreResult<()> {
        match self.conn.get() {
            Some(Ok(conn)) => conn.close().await,
            _ => Ok(()),
        }
    }

    /// Destroys the named store on the given backend, discarding all of
    /// its collections. Unknown names are a no-op.
    pub async fn destroy(backend: &Backend, name: &str) -> StoreResult<()> {
        debug!(name = %name, "destroying store");
        match backend {
            Backend::Native(engine) => {
                engine.delete(name);
                Ok(())
            }
            Backend::Sqlite { dir } => sqlite::destroy(dir, name).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CollectionSpec;
    use serde_json::json;

    fn record(id: i64) -> Record {
        match json!({ "id": id }) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn schema() -> Schema {
        Schema::new().collection("items", CollectionSpec::new())
    }

    #[tokio::test]
    async fn open_is_lazy_and_memoized() {
        let backend = Backend::native();
        let store = Store::new(backend.clone(), "lazy", 1, schema());
        let Backend::Native(engine) = &backend else {
            unreachable!()
        };

        assert!(!engine.contains("lazy"));
        store.put("items", record(1)).await.unwrap();
        assert!(engine.contains("lazy"));
    }

    #[tokio::test]
    async fn open_connects_eagerly_and_settles_repeatedly() {
        let backend = Backend::native();
        let store = Store::new(backend.clone(), "eager", 1, schema());
        store.open().await.unwrap();

        let Backend::Native(engine) = &backend else {
            unreachable!()
        };
        assert!(engine.contains("eager"));
        store.open().await.unwrap();
    }

    #[tokio::test]
    async fn failed_open_is_fatal_to_the_handle() {
        let backend = Backend::native();
        // Seed the database at a higher version, then open below it.
        Store::new(backend.clone(), "pinned", 2, schema())
            .put("items", record(1))
            .await
            .unwrap();

        let stale = Store::new(backend, "pinned", 1, schema());
        assert!(matches!(
            stale.get("items", 1).await,
            Err(StoreError::Connection(_))
        ));
        // The memoized failure resurfaces without another open attempt.
        assert!(matches!(
            stale.put("items", record(2)).await,
            Err(StoreError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn invalid_name_fails_open() {
        let store = Store::new(Backend::native(), "no spaces", 1, schema());
        assert!(matches!(
            store.get("items", 1).await,
            Err(StoreError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn version_zero_fails_open() {
        let store = Store::new(Backend::native(), "zero", 0, schema());
        assert!(matches!(
            store.get("items", 1).await,
            Err(StoreError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn close_before_open_is_a_no_op() {
        let store = Store::new(Backend::native(), "quiet", 1, schema());
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn destroy_removes_native_database() {
        let backend = Backend::native();
        let store = Store::new(backend.clone(), "doomed", 1, schema());
        store.put("items", record(1)).await.unwrap();

        Store::destroy(&backend, "doomed").await.unwrap();
        let Backend::Native(engine) = &backend else {
            unreachable!()
        };
        assert!(!engine.contains("doomed"));
    }

    #[tokio::test]
    async fn clones_share_the_connection() {
        let store = Store::new(Backend::native(), "shared", 1, schema());
        let clone = store.clone();
        store.put("items", record(7)).await.unwrap();

        let fetched = clone.get("items", 7).await.unwrap();
        assert_eq!(fetched, Some(record(7)));
    }
}
