//! Adapter for the SQL engine.
//!
//! Each store maps to one SQLite file; each collection to a table of the
//! shape `(id PRIMARY KEY, data TEXT, <one column per declared index>)`.
//! Records travel as a canonical JSON blob in `data`, with indexed fields
//! duplicated into their columns so `ORDER BY` can use them.
//!
//! `rusqlite` is synchronous, so every atomic unit runs the blocking work
//! on the tokio blocking pool behind a mutex-guarded shared connection.

use crate::adapter::EngineAdapter;
use crate::error::{ConnectionError, StoreError, StoreResult};
use crate::query::{Query, QueryResult, SortMode};
use crate::schema::{is_identifier, CollectionSpec, Schema};
use crate::{KeyValue, Record};
use parking_lot::Mutex;
use rusqlite::types::Value as SqlValue;
use rusqlite::OptionalExtension;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// A shared connection to one store's SQLite file.
#[derive(Debug, Clone)]
pub(crate) struct SqliteConnection {
    conn: Arc<Mutex<rusqlite::Connection>>,
    schema: Arc<Schema>,
}

/// Path of the database file backing the named store.
fn db_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.sqlite3"))
}

impl SqliteConnection {
    /// Opens (creating if needed) the store's database file and reconciles
    /// the declared schema inside one transaction.
    pub(crate) async fn open(
        dir: &Path,
        name: &str,
        schema: Arc<Schema>,
    ) -> Result<Self, ConnectionError> {
        let dir = dir.to_path_buf();
        let name = name.to_string();
        let reconciled = Arc::clone(&schema);

        let conn = tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&dir).map_err(ConnectionError::new)?;
            let mut conn =
                rusqlite::Connection::open(db_path(&dir, &name)).map_err(ConnectionError::new)?;
            reconcile(&mut conn, &reconciled).map_err(ConnectionError::new)?;
            Ok::<_, ConnectionError>(conn)
        })
        .await
        .map_err(ConnectionError::new)??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            schema,
        })
    }

    /// Runs one atomic unit on the blocking pool against the shared
    /// connection.
    async fn with_conn<R, F>(&self, unit: F) -> StoreResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut rusqlite::Connection) -> StoreResult<R> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            unit(&mut guard)
        })
        .await
        .map_err(StoreError::transaction)?
    }
}

/// Creates every declared table, index column, and index that is missing.
///
/// SQLite has no `ADD COLUMN IF NOT EXISTS`, so the duplicate-column
/// failure is the one per-statement error treated as success; anything
/// else aborts the transaction and fails the open.
fn reconcile(conn: &mut rusqlite::Connection, schema: &Schema) -> StoreResult<()> {
    for (name, spec) in schema.iter() {
        ensure_identifier(name)?;
        ensure_identifier(&spec.key_path)?;
        for field in spec.indices.keys() {
            ensure_identifier(field)?;
        }
    }

    debug!(collections = schema.iter().count(), "reconciling declared schema");
    let tx = conn.transaction().map_err(StoreError::transaction)?;
    for (name, spec) in schema.iter() {
        tx.execute(
            &format!("CREATE TABLE IF NOT EXISTS {name} (id PRIMARY KEY, data TEXT NOT NULL)"),
            [],
        )
        .map_err(StoreError::transaction)?;

        for field in spec.indices.keys() {
            match tx.execute(&format!("ALTER TABLE {name} ADD COLUMN {field}"), []) {
                Ok(_) => {}
                Err(e) if is_duplicate_column(&e) => {}
                Err(e) => return Err(StoreError::transaction(e)),
            }
            tx.execute(
                &format!("CREATE INDEX IF NOT EXISTS idx_{name}_{field} ON {name} ({field})"),
                [],
            )
            .map_err(StoreError::transaction)?;
        }
    }
    tx.commit().map_err(StoreError::transaction)
}

fn is_duplicate_column(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(_, Some(message))
            if message.contains("duplicate column name")
    )
}

fn ensure_identifier(name: &str) -> StoreResult<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(StoreError::invalid_identifier(name))
    }
}

fn table_exists(conn: &rusqlite::Connection, name: &str) -> StoreResult<bool> {
    conn.prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")
        .and_then(|mut stmt| stmt.exists([name]))
        .map_err(StoreError::transaction)
}

/// Maps a primary key to its SQL parameter.
fn key_to_sql(key: &KeyValue) -> SqlValue {
    match key {
        KeyValue::Null => SqlValue::Null,
        KeyValue::Integer(i) => SqlValue::Integer(*i),
        KeyValue::Float(f) => SqlValue::Real(*f),
        KeyValue::Text(s) => SqlValue::Text(s.clone()),
    }
}

/// Maps a record field into its index column: scalars natively, compound
/// values as their JSON text, absent fields as NULL.
fn field_to_sql(value: Option<&serde_json::Value>) -> SqlValue {
    match value {
        None | Some(serde_json::Value::Null) => SqlValue::Null,
        Some(serde_json::Value::Bool(b)) => SqlValue::Integer(i64::from(*b)),
        Some(serde_json::Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                SqlValue::Integer(i)
            } else {
                SqlValue::Real(n.as_f64().unwrap_or_default())
            }
        }
        Some(serde_json::Value::String(s)) => SqlValue::Text(s.clone()),
        Some(compound) => SqlValue::Text(compound.to_string()),
    }
}

impl EngineAdapter for SqliteConnection {
    async fn put(&self, collection: &str, records: Vec<Record>) -> StoreResult<()> {
        let collection = collection.to_string();
        // Undeclared collections get the default spec, as the declared
        // schema is advisory for writes; the INSERT fails naturally if
        // the table does not exist.
        let spec = self
            .schema
            .get(&collection)
            .cloned()
            .unwrap_or_else(CollectionSpec::new);

        self.with_conn(move |conn| {
            ensure_identifier(&collection)?;
            let fields: Vec<&String> = spec.indices.keys().collect();
            let mut sql = format!("INSERT OR REPLACE INTO {collection} (id, data");
            for field in &fields {
                sql.push_str(", ");
                sql.push_str(field);
            }
            sql.push_str(") VALUES (?, ?");
            for _ in &fields {
                sql.push_str(", ?");
            }
            sql.push(')');

            let tx = conn.transaction().map_err(StoreError::transaction)?;
            {
                let mut stmt = tx.prepare(&sql).map_err(StoreError::transaction)?;
                for record in &records {
                    let key = record
                        .get(&spec.key_path)
                        .and_then(KeyValue::from_json)
                        .ok_or_else(|| {
                            StoreError::missing_key(&collection, &spec.key_path)
                        })?;

                    let mut params = vec![
                        key_to_sql(&key),
                        SqlValue::Text(serde_json::to_string(record)?),
                    ];
                    for field in &fields {
                        params.push(field_to_sql(record.get(field.as_str())));
                    }
                    stmt.execute(rusqlite::params_from_iter(params))
                        .map_err(StoreError::transaction)?;
                }
            }
            tx.commit().map_err(StoreError::transaction)
        })
        .await
    }

    async fn get(&self, collection: &str, key: KeyValue) -> StoreResult<Option<Record>> {
        let collection = collection.to_string();
        self.with_conn(move |conn| {
            ensure_identifier(&collection)?;
            let blob: Option<String> = conn
                .query_row(
                    &format!("SELECT data FROM {collection} WHERE id = ?1 LIMIT 1"),
                    [key_to_sql(&key)],
                    |row| row.get(0),
                )
                .optional()
                .map_err(StoreError::transaction)?;

            match blob {
                Some(text) => Ok(Some(serde_json::from_str(&text)?)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn remove(&self, collection: &str, keys: Vec<KeyValue>) -> StoreResult<()> {
        let collection = collection.to_string();
        self.with_conn(move |conn| {
            ensure_identifier(&collection)?;
            let tx = conn.transaction().map_err(StoreError::transaction)?;
            {
                let mut stmt = tx
                    .prepare(&format!("DELETE FROM {collection} WHERE id = ?1"))
                    .map_err(StoreError::transaction)?;
                for key in &keys {
                    stmt.execute([key_to_sql(key)])
                        .map_err(StoreError::transaction)?;
                }
            }
            tx.commit().map_err(StoreError::transaction)
        })
        .await
    }

    async fn clear(&self, names: Vec<String>) -> StoreResult<()> {
        self.with_conn(move |conn| {
            let tx = conn.transaction().map_err(StoreError::transaction)?;
            for name in &names {
                ensure_identifier(name)?;
                if !table_exists(&tx, name)? {
                    continue;
                }
                tx.execute(&format!("DELETE FROM {name}"), [])
                    .map_err(StoreError::transaction)?;
            }
            tx.commit().map_err(StoreError::transaction)
        })
        .await
    }

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<QueryResult> {
        let collection = collection.to_string();
        let query = query.clone();
        let schema = Arc::clone(&self.schema);

        self.with_conn(move |conn| {
            ensure_identifier(&collection)?;
            let tx = conn.transaction().map_err(StoreError::transaction)?;
            if !table_exists(&tx, &collection)? {
                return Ok(QueryResult::empty());
            }

            let total_entries: i64 = tx
                .query_row(&format!("SELECT COUNT(id) FROM {collection}"), [], |row| {
                    row.get(0)
                })
                .map_err(StoreError::transaction)?;

            let dir = match query.sort_mode {
                SortMode::Ascending => "ASC",
                SortMode::Descending => "DESC",
            };
            // Order by the index column when declared, with the primary
            // key as tie-break so both backends agree on ties; otherwise
            // by primary key alone.
            let mut sql = match query.order.as_deref() {
                Some(field) if schema.has_index(&collection, field) => {
                    format!("SELECT data FROM {collection} ORDER BY {field} {dir}, id {dir}")
                }
                _ => format!("SELECT data FROM {collection} ORDER BY id {dir}"),
            };
            if let Some(per_page) = query.resolved_per_page() {
                sql.push_str(&format!(" LIMIT {per_page}"));
                let offset = query.offset();
                if offset > 0 {
                    sql.push_str(&format!(" OFFSET {offset}"));
                }
            }

            let mut results = Vec::new();
            {
                let mut stmt = tx.prepare(&sql).map_err(StoreError::transaction)?;
                let rows = stmt
                    .query_map([], |row| row.get::<_, String>(0))
                    .map_err(StoreError::transaction)?;
                for blob in rows {
                    let blob = blob.map_err(StoreError::transaction)?;
                    results.push(serde_json::from_str(&blob)?);
                }
            }
            tx.commit().map_err(StoreError::transaction)?;

            Ok(QueryResult {
                results,
                total_entries: total_entries.max(0) as u64,
            })
        })
        .await
    }
}

/// Destroys the named store: every user table in its database file is
/// dropped. Missing files are a no-op.
pub(crate) async fn destroy(dir: &Path, name: &str) -> StoreResult<()> {
    let path = db_path(dir, name);
    tokio::task::spawn_blocking(move || {
        if !path.exists() {
            return Ok(());
        }
        let conn = rusqlite::Connection::open(&path).map_err(StoreError::transaction)?;
        let tables: Vec<String> = conn
            .prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
            )
            .and_then(|mut stmt| {
                stmt.query_map([], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()
            })
            .map_err(StoreError::transaction)?;

        for table in tables {
            ensure_identifier(&table)?;
            conn.execute(&format!("DROP TABLE {table}"), [])
                .map_err(StoreError::transaction)?;
        }
        Ok(())
    })
    .await
    .map_err(StoreError::transaction)?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CollectionSpec;

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new().collection("items", CollectionSpec::new().index("x")))
    }

    #[test]
    fn reconcile_twice_is_idempotent() {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        reconcile(&mut conn, &schema()).unwrap();
        reconcile(&mut conn, &schema()).unwrap();

        assert!(table_exists(&conn, "items").unwrap());
        let indexes: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(indexes, vec!["idx_items_x".to_string()]);
    }

    #[test]
    fn reconcile_tolerates_existing_column() {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE items (id PRIMARY KEY, data TEXT NOT NULL, x)",
            [],
        )
        .unwrap();
        reconcile(&mut conn, &schema()).unwrap();
        assert!(table_exists(&conn, "items").unwrap());
    }

    #[test]
    fn reconcile_preserves_existing_rows() {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        reconcile(&mut conn, &schema()).unwrap();
        conn.execute(
            "INSERT INTO items (id, data, x) VALUES (1, '{\"id\":1}', 5)",
            [],
        )
        .unwrap();
        reconcile(&mut conn, &schema()).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(id) FROM items", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn reconcile_rejects_hostile_identifiers() {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        let hostile = Schema::new().collection("items; drop table x", CollectionSpec::new());
        let err = reconcile(&mut conn, &hostile);
        assert!(matches!(err, Err(StoreError::InvalidIdentifier { .. })));
    }

    #[test]
    fn field_mapping_covers_json_kinds() {
        use serde_json::json;

        assert_eq!(field_to_sql(None), SqlValue::Null);
        assert_eq!(field_to_sql(Some(&json!(null))), SqlValue::Null);
        assert_eq!(field_to_sql(Some(&json!(true))), SqlValue::Integer(1));
        assert_eq!(field_to_sql(Some(&json!(7))), SqlValue::Integer(7));
        assert_eq!(field_to_sql(Some(&json!(1.5))), SqlValue::Real(1.5));
        assert_eq!(
            field_to_sql(Some(&json!("hi"))),
            SqlValue::Text("hi".into())
        );
        assert_eq!(
            field_to_sql(Some(&json!([1, 2]))),
            SqlValue::Text("[1,2]".into())
        );
    }
}
