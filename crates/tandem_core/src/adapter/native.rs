//! Adapter for the native cursor-based engine.

use crate::adapter::EngineAdapter;
use crate::error::{ConnectionError, StoreResult};
use crate::query::{Query, QueryResult, SortMode};
use crate::schema::Schema;
use crate::{KeyValue, Record};
use std::sync::Arc;
use tandem_engine::{Cursor, Database, Direction, Engine, EngineResult, UpgradeTxn};
use tracing::debug;

/// An open native-engine database plus the schema it was reconciled to.
#[derive(Debug, Clone)]
pub(crate) struct NativeConnection {
    db: Arc<Database>,
    schema: Arc<Schema>,
}

impl NativeConnection {
    /// Opens the named database at `version`, reconciling the schema
    /// inside the engine's upgrade unit when the version increases.
    pub(crate) fn open(
        engine: &Engine,
        name: &str,
        version: u32,
        schema: Arc<Schema>,
    ) -> Result<Self, ConnectionError> {
        let db = engine
            .open(name, version, |txn| reconcile(txn, &schema))
            .map_err(ConnectionError::new)?;
        Ok(Self { db, schema })
    }
}

/// Walks the declared schema and creates every missing structure.
///
/// Additive only: existing collections keep their key path and records,
/// and creating an existing index is a no-op. Runs inside the upgrade
/// unit, so a failure fails the open.
fn reconcile(txn: &mut UpgradeTxn<'_>, schema: &Schema) -> EngineResult<()> {
    debug!(from_version = txn.old_version(), "reconciling declared schema");
    for (name, spec) in schema.iter() {
        txn.create_collection(name, &spec.key_path);
        for field in spec.indices.keys() {
            txn.create_index(name, field)?;
        }
    }
    Ok(())
}

fn direction(mode: SortMode) -> Direction {
    match mode {
        SortMode::Ascending => Direction::Forward,
        SortMode::Descending => Direction::Reverse,
    }
}

impl EngineAdapter for NativeConnection {
    async fn put(&self, collection: &str, records: Vec<Record>) -> StoreResult<()> {
        self.db
            .write(|txn| txn.put_all(collection, records))
            .map_err(Into::into)
    }

    async fn get(&self, collection: &str, key: KeyValue) -> StoreResult<Option<Record>> {
        self.db
            .read(|txn| {
                Ok(txn
                    .collection(collection)
                    .and_then(|c| c.get(&key).cloned()))
            })
            .map_err(Into::into)
    }

    async fn remove(&self, collection: &str, keys: Vec<KeyValue>) -> StoreResult<()> {
        self.db
            .write(|txn| txn.remove_all(collection, &keys))
            .map_err(Into::into)
    }

    async fn clear(&self, names: Vec<String>) -> StoreResult<()> {
        self.db
            .write(|txn| {
                txn.clear(&names);
                Ok(())
            })
            .map_err(Into::into)
    }

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<QueryResult> {
        self.db
            .read(|txn| {
                let Some(col) = txn.collection(collection) else {
                    return Ok(QueryResult::empty());
                };

                // Count first; it covers the whole collection regardless
                // of the iteration path chosen below.
                let total_entries = col.count();
                let dir = direction(query.sort_mode);

                let mut cursor: Cursor<'_> = match query.order.as_deref() {
                    Some(field)
                        if self.schema.has_index(collection, field)
                            && col.has_index(field) =>
                    {
                        col.index_cursor(field, dir)
                            .unwrap_or_else(|| col.cursor(dir))
                    }
                    _ => col.cursor(dir),
                };

                let skip = query.offset();
                if skip > 0 {
                    cursor.advance(skip);
                }

                let limit = query.resolved_per_page();
                let mut results = Vec::new();
                while let Some(record) = cursor.next() {
                    if limit.is_some_and(|l| results.len() as u64 >= u64::from(l)) {
                        break;
                    }
                    results.push(record.clone());
                }

                Ok(QueryResult {
                    results,
                    total_entries,
                })
            })
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CollectionSpec;
    use serde_json::json;

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new().collection("items", CollectionSpec::new().index("x")))
    }

    fn open(engine: &Engine) -> NativeConnection {
        NativeConnection::open(engine, "test", 1, schema()).unwrap()
    }

    #[test]
    fn reconcile_is_idempotent_across_version_bumps() {
        let engine = Engine::new();
        let conn = open(&engine);
        conn.db
            .write(|txn| {
                txn.put_all(
                    "items",
                    vec![json!({"id": 1, "x": 9}).as_object().cloned().unwrap()],
                )
            })
            .unwrap();

        // Version bump runs reconciliation again over live structures.
        let again = NativeConnection::open(&engine, "test", 2, schema()).unwrap();
        again
            .db
            .read(|txn| {
                let c = txn.collection("items").unwrap();
                assert_eq!(c.count(), 1);
                assert!(c.has_index("x"));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn version_downgrade_fails_open() {
        let engine = Engine::new();
        NativeConnection::open(&engine, "test", 3, schema()).unwrap();
        let err = NativeConnection::open(&engine, "test", 2, schema());
        assert!(err.is_err());
    }
}
