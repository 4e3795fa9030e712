//! Request handlers for the checklist routes.
//!
//! Each handler runs one full load (and, for mutations, one full save) under
//! the state's store lock, then answers with exactly one JSON response.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use preflight_core::{Checklist, Error, Item};

use crate::api::{AddItemRequest, CreateChecklistRequest, ErrorResponse};
use crate::server::AppState;

/// Message returned when a save fails under strict persistence.
pub const PERSIST_FAILED: &str = "Failed to persist checklists";

/// Error wrapper that renders a [`preflight_core::Error`] as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// Returns the HTTP status for the wrapped error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::ChecklistNotFound { .. } | Error::ItemNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if self.0.is_client_error() {
            self.0.to_string()
        } else {
            tracing::error!(error = %self.0, "Request failed");
            match &self.0 {
                Error::Persistence { .. } => PERSIST_FAILED.to_string(),
                _ => "Internal server error".to_string(),
            }
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Unwraps a JSON body, treating an unparseable one as an empty object.
fn body_or_default<T: Default>(body: std::result::Result<Json<T>, JsonRejection>) -> T {
    match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::debug!(reason = %rejection.body_text(), "Ignoring unusable request body");
            T::default()
        },
    }
}

// === Health ===

pub(crate) async fn health() -> &'static str {
    "OK"
}

// === Checklists ===

pub(crate) async fn list_checklists(State(state): State<Arc<AppState>>) -> Json<Vec<Checklist>> {
    let _guard = state.store_lock.read().await;
    let collection = state.store.load().await;
    Json(collection.checklists)
}

pub(crate) async fn get_checklist(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Checklist>> {
    let _guard = state.store_lock.read().await;
    let mut collection = state.store.load().await;

    // First match wins; take it out of the freshly loaded copy.
    let checklist = collection
        .remove_checklist(&name)
        .ok_or_else(|| Error::checklist_not_found(&name))?;
    Ok(Json(checklist))
}

pub(crate) async fn create_checklist(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<CreateChecklistRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Checklist>)> {
    let name = body_or_default(body).into_name()?;

    let _guard = state.store_lock.write().await;
    let mut collection = state.store.load().await;

    let checklist = Checklist::new(name);
    collection.push_checklist(checklist.clone());
    state.persist(&collection).await?;

    tracing::info!(checklist = %checklist.name, "Checklist created");
    Ok((StatusCode::CREATED, Json(checklist)))
}

pub(crate) async fn delete_checklist(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<StatusCode> {
    let _guard = state.store_lock.write().await;
    let mut collection = state.store.load().await;

    let removed = collection
        .remove_checklist(&name)
        .ok_or_else(|| Error::checklist_not_found(&name))?;
    state.persist(&collection).await?;

    tracing::info!(checklist = %name, items = removed.items.len(), "Checklist deleted");
    Ok(StatusCode::NO_CONTENT)
}

// === Items ===

pub(crate) async fn add_item(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: std::result::Result<Json<AddItemRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Item>)> {
    let item = body_or_default(body).into_item()?;

    let _guard = state.store_lock.write().await;
    let mut collection = state.store.load().await;

    let checklist = collection
        .checklist_mut(&name)
        .ok_or_else(|| Error::checklist_not_found(&name))?;
    checklist.push_item(item.clone());
    state.persist(&collection).await?;

    tracing::info!(checklist = %name, serial = %item.serial, "Item added");
    Ok((StatusCode::CREATED, Json(item)))
}

pub(crate) async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path((name, serial)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let _guard = state.store_lock.write().await;
    let mut collection = state.store.load().await;

    let checklist = collection
        .checklist_mut(&name)
        .ok_or_else(|| Error::checklist_not_found(&name))?;
    checklist
        .remove_item(&serial)
        .ok_or_else(|| Error::item_not_found(&name, &serial))?;
    state.persist(&collection).await?;

    tracing::info!(checklist = %name, serial = %serial, "Item deleted");
    Ok(StatusCode::NO_CONTENT)
}
