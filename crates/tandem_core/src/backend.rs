//! Engine selection: the capability value passed into handles.
//!
//! Capability resolution happens once, explicitly, at process start -
//! [`Backend::detect`] produces a value that handle constructors receive.
//! Nothing is read from ambient globals afterwards.

use std::path::PathBuf;
use tandem_engine::Engine;

/// Configuration for capability resolution.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Prefer the native cursor engine when it is usable. When false,
    /// stores run on SQLite for durable, file-backed storage.
    pub prefer_native: bool,

    /// Directory holding SQLite database files, one per store name.
    pub data_dir: PathBuf,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            prefer_native: true,
            data_dir: std::env::temp_dir(),
        }
    }
}

impl BackendConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to prefer the native engine.
    #[must_use]
    pub fn prefer_native(mut self, value: bool) -> Self {
        self.prefer_native = value;
        self
    }

    /// Sets the SQLite data directory.
    #[must_use]
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }
}

/// The selected storage engine, shared by every handle built from it.
#[derive(Debug, Clone)]
pub enum Backend {
    /// The native cursor-based key-value/index engine.
    Native(Engine),
    /// SQLite files under a data directory.
    Sqlite {
        /// Directory holding one database file per store name.
        dir: PathBuf,
    },
}

impl Backend {
    /// Resolves the backend to use for this process.
    #[must_use]
    pub fn detect(config: &BackendConfig) -> Self {
        if config.prefer_native {
            Self::native()
        } else {
            Self::sqlite(config.data_dir.clone())
        }
    }

    /// A fresh native engine.
    #[must_use]
    pub fn native() -> Self {
        Self::Native(Engine::new())
    }

    /// The SQLite engine rooted at `dir`.
    #[must_use]
    pub fn sqlite(dir: impl Into<PathBuf>) -> Self {
        Self::Sqlite { dir: dir.into() }
    }
}
