//! Error types for the Preflight service.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Preflight.
#[derive(Error, Debug)]
pub enum Error {
    /// No checklist has the requested name.
    #[error("Checklist not found")]
    ChecklistNotFound {
        /// The requested checklist name.
        name: String,
    },

    /// The checklist exists but holds no item with the requested serial.
    #[error("Item not found")]
    ItemNotFound {
        /// Name of the checklist that was searched.
        checklist: String,
        /// The requested item serial.
        serial: String,
    },

    /// A required request field was missing or empty.
    #[error("{message}")]
    Validation {
        /// Message naming the missing field(s).
        message: String,
    },

    /// The collection could not be written to its backing file.
    #[error("Failed to persist checklists to {}: {source}", path.display())]
    Persistence {
        /// Path of the backing file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error (unexpected state).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl Error {
    /// Returns `true` if this error means an addressed record does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ChecklistNotFound { .. } | Self::ItemNotFound { .. }
        )
    }

    /// Returns `true` if the caller, not the service, is at fault.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.is_not_found() || matches!(self, Self::Validation { .. })
    }

    /// Creates a checklist-not-found error.
    #[must_use]
    pub fn checklist_not_found(name: impl Into<String>) -> Self {
        Self::ChecklistNotFound { name: name.into() }
    }

    /// Creates an item-not-found error.
    #[must_use]
    pub fn item_not_found(checklist: impl Into<String>, serial: impl Into<String>) -> Self {
        Self::ItemNotFound {
            checklist: checklist.into(),
            serial: serial.into(),
        }
    }

    /// Creates a validation error with the given message.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates an internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
