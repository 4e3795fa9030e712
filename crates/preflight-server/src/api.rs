//! Request and response bodies for the checklist API.
//!
//! Request fields are all optional at the wire level; each request type
//! checks presence itself so a missing field yields the API's own 400 message
//! rather than a deserializer error.

use serde::{Deserialize, Deserializer, Serialize};

use preflight_core::{Error, Item, Result};

/// Message returned when a checklist is created without a name.
pub const NAME_REQUIRED: &str = "Name is required";

/// Message returned when an item is added without a name or serial.
pub const ITEM_FIELDS_REQUIRED: &str = "Item name and serial are required";

/// Accepts any JSON value, keeping it only if it is a non-empty string.
fn non_empty_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    })
}

// === Checklists ===

/// Body of `POST /checklists`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateChecklistRequest {
    /// Name of the new checklist.
    #[serde(default, deserialize_with = "non_empty_string")]
    pub name: Option<String>,
}

impl CreateChecklistRequest {
    /// Returns the checklist name.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the name is missing or empty.
    pub fn into_name(self) -> Result<String> {
        self.name.ok_or_else(|| Error::validation(NAME_REQUIRED))
    }
}

// === Items ===

/// Body of `POST /checklists/{name}/items`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    /// Item name.
    #[serde(default, deserialize_with = "non_empty_string")]
    pub item_name: Option<String>,
    /// Item serial.
    #[serde(default, deserialize_with = "non_empty_string")]
    pub item_serial: Option<String>,
}

impl AddItemRequest {
    /// Builds the item to append.
    ///
    /// # Errors
    ///
    /// Returns a validation error unless both fields are present and non-empty.
    pub fn into_item(self) -> Result<Item> {
        match (self.item_name, self.item_serial) {
            (Some(name), Some(serial)) => Ok(Item::new(name, serial)),
            _ => Err(Error::validation(ITEM_FIELDS_REQUIRED)),
        }
    }
}

// === Errors ===

/// Error body: `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message.
    pub error: String,
}

impl ErrorResponse {
    /// Creates an error body.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
