//! Error types for store operations.
//!
//! The taxonomy is deliberately small. A [`StoreError::Connection`] means
//! the handle's open or upgrade failed and will keep failing (the result
//! is memoized); a [`StoreError::Transaction`] means one operation's
//! atomic unit aborted and the handle stays usable. Not-found is never an
//! error: `get` resolves with `None`, and unknown names given to `clear`
//! or `query` are tolerated.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A failed open or upgrade.
///
/// Cloneable so the memoized fail-once open can re-surface the same
/// failure to every later caller.
#[derive(Debug, Clone, Error)]
#[error("connection failed: {message}")]
pub struct ConnectionError {
    message: String,
}

impl ConnectionError {
    /// Creates a connection error from any displayable cause.
    pub(crate) fn new(cause: impl std::fmt::Display) -> Self {
        Self {
            message: cause.to_string(),
        }
    }

    /// Description of the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Open or upgrade failed; fatal to the handle, never auto-retried.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// An operation's atomic unit aborted; the handle remains usable.
    #[error("transaction aborted: {message}")]
    Transaction {
        /// Description of the abort.
        message: String,
    },

    /// A record passed to `put` has no usable key-path field.
    #[error("record has no usable '{key_path}' key for collection '{collection}'")]
    MissingKey {
        /// Collection the record was destined for.
        collection: String,
        /// The key path that could not be extracted.
        key_path: String,
    },

    /// A stored record could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A collection or field name is not a usable identifier.
    #[error("invalid identifier: '{name}'")]
    InvalidIdentifier {
        /// The offending name.
        name: String,
    },
}

impl StoreError {
    /// Creates a transaction error from any displayable cause.
    pub(crate) fn transaction(cause: impl std::fmt::Display) -> Self {
        Self::Transaction {
            message: cause.to_string(),
        }
    }

    /// Creates a missing-key error.
    pub(crate) fn missing_key(collection: impl Into<String>, key_path: impl Into<String>) -> Self {
        Self::MissingKey {
            collection: collection.into(),
            key_path: key_path.into(),
        }
    }

    /// Creates an invalid-identifier error.
    pub(crate) fn invalid_identifier(name: impl Into<String>) -> Self {
        Self::InvalidIdentifier { name: name.into() }
    }
}

impl From<tandem_engine::EngineError> for StoreError {
    fn from(e: tandem_engine::EngineError) -> Self {
        match e {
            tandem_engine::EngineError::MissingKey {
                collection,
                key_path,
            } => Self::MissingKey {
                collection,
                key_path,
            },
            other => Self::transaction(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_error_is_cloneable() {
        let e = ConnectionError::new("backend unavailable");
        let c = e.clone();
        assert_eq!(e.message(), c.message());
        assert_eq!(
            StoreError::from(c).to_string(),
            "connection failed: backend unavailable"
        );
    }

    #[test]
    fn engine_missing_key_maps_to_missing_key() {
        let e = tandem_engine::EngineError::missing_key("users", "id");
        assert!(matches!(
            StoreError::from(e),
            StoreError::MissingKey { .. }
        ));
    }

    #[test]
    fn engine_errors_map_to_transaction() {
        let e = tandem_engine::EngineError::collection_not_found("users");
        assert!(matches!(
            StoreError::from(e),
            StoreError::Transaction { .. }
        ));
    }
}
