//! Error types for engine operations.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A database was opened with a version lower than the stored one.
    #[error("version conflict on '{name}': stored version {stored}, requested {requested}")]
    VersionConflict {
        /// Name of the database.
        name: String,
        /// Version currently stored.
        stored: u32,
        /// Version the caller requested.
        requested: u32,
    },

    /// The named collection does not exist.
    #[error("collection not found: {name}")]
    CollectionNotFound {
        /// Name of the collection.
        name: String,
    },

    /// A record is missing its key-path field or it is not a scalar.
    #[error("record has no usable '{key_path}' key in collection '{collection}'")]
    MissingKey {
        /// Collection the record was destined for.
        collection: String,
        /// The key path that could not be extracted.
        key_path: String,
    },

    /// An upgrade unit was aborted by the caller.
    #[error("upgrade aborted: {message}")]
    UpgradeAborted {
        /// Description of the failure.
        message: String,
    },
}

impl EngineError {
    /// Creates a collection-not-found error.
    pub fn collection_not_found(name: impl Into<String>) -> Self {
        Self::CollectionNotFound { name: name.into() }
    }

    /// Creates a missing-key error.
    pub fn missing_key(collection: impl Into<String>, key_path: impl Into<String>) -> Self {
        Self::MissingKey {
            collection: collection.into(),
            key_path: key_path.into(),
        }
    }

    /// Creates an upgrade-aborted error.
    pub fn upgrade_aborted(message: impl Into<String>) -> Self {
        Self::UpgradeAborted {
            message: message.into(),
        }
    }
}
