//! Keyset cursors for paginated queries.
//!
//! A cursor records where the previous page ended: the value of the ordering
//! field on the last returned document plus that document's id. Clients only
//! ever see the opaque encoded form.

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DocStoreError, DocStoreResult};

/// Position of the last document of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    /// Ordering-field value of the last document (`null` when unordered)
    #[serde(rename = "v")]
    pub value: Value,
    /// Id of the last document, used as the tie breaker
    #[serde(rename = "id")]
    pub id: String,
}

impl Cursor {
    pub fn new(value: Value, id: impl Into<String>) -> Self {
        Self {
            value,
            id: id.into(),
        }
    }

    /// Encode as URL-safe base64 of the JSON form.
    pub fn encode(&self) -> String {
        // Serializing a Value plus a String cannot fail.
        let raw = serde_json::to_vec(self).unwrap_or_default();
        general_purpose::URL_SAFE_NO_PAD.encode(raw)
    }

    /// Decode a cursor previously produced by [`Cursor::encode`].
    pub fn decode(encoded: &str) -> DocStoreResult<Self> {
        let raw = general_purpose::URL_SAFE_NO_PAD
            .decode(encoded.trim())
            .map_err(|e| DocStoreError::InvalidCursor(format!("not base64: {}", e)))?;

        serde_json::from_slice(&raw)
            .map_err(|e| DocStoreError::InvalidCursor(format!("malformed payload: {}", e)))
    }
}
