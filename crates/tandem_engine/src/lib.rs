//! # Tandem Engine
//!
//! Native key-value/index engine for TandemDB.
//!
//! This crate provides the cursor-based storage collaborator that the
//! document-store layer drives through its native adapter:
//! - Named databases opened by `(name, version)` with an upgrade unit that
//!   runs exactly when the version increases
//! - Collections keyed by an extracted primary-key field
//! - Secondary indexes with automatic backfill and maintenance
//! - Directional cursors with skip-ahead and early termination
//! - Atomic read and write units over a shared database handle
//!
//! ## Design Principles
//!
//! - The engine stores records structurally (JSON maps); it never
//!   serializes them
//! - Every write unit is all-or-nothing: inputs are validated before any
//!   record is touched
//! - Upgrade units roll the database back on failure
//! - All handles are `Send + Sync` and safe to share across threads
//!
//! ## Example
//!
//! ```rust
//! use tandem_engine::{Direction, Engine};
//!
//! let engine = Engine::new();
//! let db = engine
//!     .open("example", 1, |upgrade| {
//!         upgrade.create_collection("users", "id");
//!         upgrade.create_index("users", "age")
//!     })
//!     .unwrap();
//!
//! db.write(|txn| {
//!     txn.put_all(
//!         "users",
//!         vec![serde_json::json!({"id": 1, "age": 33})
//!             .as_object()
//!             .cloned()
//!             .unwrap()],
//!     )
//! })
//! .unwrap();
//!
//! let ages: Vec<i64> = db
//!     .read(|txn| {
//!         let users = txn.collection("users").unwrap();
//!         let mut cursor = users.index_cursor("age", Direction::Forward).unwrap();
//!         let mut out = Vec::new();
//!         while let Some(record) = cursor.next() {
//!             out.push(record["age"].as_i64().unwrap());
//!         }
//!         Ok(out)
//!     })
//!     .unwrap();
//! assert_eq!(ages, vec![33]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collection;
mod cursor;
mod database;
mod engine;
mod error;
mod key;

pub use collection::Collection;
pub use cursor::{Cursor, Direction};
pub use database::{Database, ReadTxn, UpgradeTxn, WriteTxn};
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use key::KeyValue;

/// A stored record: a JSON object with at least the key-path field set.
pub type Record = serde_json::Map<String, serde_json::Value>;
