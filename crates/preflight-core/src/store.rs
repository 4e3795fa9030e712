//! Collection storage backends.
//!
//! Every operation goes through a full [`CollectionStore::load`] and, for
//! mutations, a full [`CollectionStore::save`]. Nothing is cached between calls.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::model::Collection;

/// Default backing file name.
pub const DEFAULT_DATA_FILE: &str = "data.json";

/// Trait for collection storage backends.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Loads the whole collection.
    ///
    /// Never fails: a missing, unreadable, or undecodable representation
    /// yields an empty collection.
    async fn load(&self) -> Collection;

    /// Replaces the stored collection with `collection`.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be encoded or written.
    async fn save(&self, collection: &Collection) -> Result<()>;
}

/// Flat-file store holding the collection as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store backed by the file at `path`. The file need not exist.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }

    fn persistence_error(&self, source: std::io::Error) -> Error {
        Error::Persistence {
            path: self.path.clone(),
            source,
        }
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_FILE)
    }
}

#[async_trait]
impl CollectionStore for JsonFileStore {
    async fn load(&self) -> Collection {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Data file absent, starting empty");
                return Collection::new();
            },
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Error reading data file");
                return Collection::new();
            },
        };

        match serde_json::from_str(&data) {
            Ok(collection) => collection,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Error decoding data file");
                Collection::new()
            },
        }
    }

    async fn save(&self, collection: &Collection) -> Result<()> {
        let json = serde_json::to_string_pretty(collection)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.persistence_error(e))?;
        }

        // Write a sibling first so a failed write never truncates the live file.
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| self.persistence_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.persistence_error(e))?;

        tracing::debug!(
            path = %self.path.display(),
            checklists = collection.len(),
            "Collection saved"
        );
        Ok(())
    }
}

/// In-memory store (for development/testing).
#[derive(Debug, Default)]
pub struct MemoryStore {
    collection: RwLock<Collection>,
}

impl MemoryStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an in-memory store seeded with `collection`.
    #[must_use]
    pub fn with_collection(collection: Collection) -> Self {
        Self {
            collection: RwLock::new(collection),
        }
    }
}

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn load(&self) -> Collection {
        self.collection.read().clone()
    }

    async fn save(&self, collection: &Collection) -> Result<()> {
        *self.collection.write() = collection.clone();
        Ok(())
    }
}
