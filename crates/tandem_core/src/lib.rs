//! # Tandem Core
//!
//! An embedded document store with one asynchronous contract over two
//! storage engines.
//!
//! This crate provides:
//! - A declarative [`Schema`] (collections, key paths, indexes)
//! - A [`Store`] handle with a lazily-opened, memoized connection
//! - Uniform operations: put, get, remove, clear, and paginated/ordered
//!   [`query`](Store::query)
//! - Two engine adapters behind one contract: the native cursor engine
//!   from `tandem_engine` and SQLite via `rusqlite`
//!
//! ## Architecture
//!
//! The hard part lives in the query executor and the schema reconciler,
//! both implemented once per adapter with identical result semantics:
//! ordering (indexed field or primary key, ascending or descending),
//! offset by cursor advance / `OFFSET`, limit, and a total count that
//! always reflects the whole collection.
//!
//! Reconciliation is additive-only and idempotent: declared collections
//! and indexes are created when absent and never dropped or modified.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tandem_core::{Backend, CollectionSpec, Query, Schema, Store};
//!
//! let schema = Schema::new().collection("posts", CollectionSpec::new().index("age"));
//! let store = Store::new(Backend::native(), "app", 1, schema);
//!
//! store.put("posts", serde_json::json!({"id": 1, "age": 30})
//!     .as_object().cloned().unwrap()).await?;
//! let page = store.query("posts", &Query::new().order("age").page(1)).await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod backend;
mod error;
mod query;
mod schema;
mod store;

pub use backend::{Backend, BackendConfig};
pub use error::{ConnectionError, StoreError, StoreResult};
pub use query::{Query, QueryResult, SortMode, DEFAULT_PER_PAGE};
pub use schema::{CollectionSpec, IndexSpec, Schema};
pub use store::Store;

// The native engine's vocabulary types are part of the public surface.
pub use tandem_engine::{Engine, KeyValue, Record};
