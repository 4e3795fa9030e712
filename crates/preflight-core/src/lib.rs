//! # Preflight Core
//!
//! Core types and storage for the Preflight checklist service.
//!
//! This crate provides the foundational pieces shared by the server and CLI:
//! - The checklist data model ([`Collection`], [`Checklist`], [`Item`])
//! - The common error type
//! - Whole-collection storage backends behind [`CollectionStore`]

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod model;
pub mod store;

pub use error::{Error, Result};
pub use model::{Checklist, Collection, Item};
pub use store::{CollectionStore, JsonFileStore, MemoryStore, DEFAULT_DATA_FILE};
