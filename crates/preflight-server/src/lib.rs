//! # Preflight Server
//!
//! HTTP API server exposing create/read/delete operations over checklists.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod handlers;
pub mod server;

pub use handlers::ApiError;
pub use server::{AppState, Server, ServerConfig, DEFAULT_PORT};
