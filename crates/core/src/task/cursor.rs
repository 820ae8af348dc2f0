//! Opaque pagination cursors
//!
//! A cursor is URL-safe base64 over a small JSON document holding the sort
//! order, the filter and search it was issued under, and the [`Position`] of
//! the last task served.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

use super::model::{TaskPriority, TaskStatus};
use super::query::{Position, SortField, SortOrder};
use crate::{Error, Result};

/// Filter and normalized search term a cursor was issued under
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Scope {
    #[serde(rename = "st", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(rename = "pr", default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    /// Lowercased, non-empty search term
    #[serde(rename = "q", default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Cursor {
    #[serde(rename = "o")]
    pub order: SortOrder,
    #[serde(rename = "f")]
    pub scope: Scope,
    #[serde(rename = "p")]
    pub position: Position,
}

impl Cursor {
    pub fn encode(&self) -> Result<String> {
        let payload = serde_json::to_vec(self)
            .map_err(|e| Error::InvalidCursor(format!("failed to encode cursor: {e}")))?;
        Ok(URL_SAFE_NO_PAD.encode(payload))
    }

    pub fn decode(token: &str) -> Result<Self> {
        let payload = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| Error::InvalidCursor("cursor is not valid base64".to_string()))?;
        serde_json::from_slice(&payload)
            .map_err(|_| Error::InvalidCursor("cursor payload is malformed".to_string()))
    }

    /// A cursor only makes sense for the result set and ordering that
    /// produced it.
    pub fn check_compatible(
        &self,
        scope: &Scope,
        sort_by: Option<SortField>,
        order: SortOrder,
    ) -> Result<()> {
        if &self.scope != scope {
            return Err(Error::InvalidCursor(
                "cursor was issued for a different filter or search".to_string(),
            ));
        }
        let issued_for = self.position.key.as_ref().map(|key| key.field());
        if issued_for != sort_by {
            return Err(Error::InvalidCursor(format!(
                "cursor was issued for sort_by={}, query uses sort_by={}",
                issued_for.map_or("none", SortField::as_str),
                sort_by.map_or("none", SortField::as_str),
            )));
        }
        if sort_by.is_some() && self.order != order {
            return Err(Error::InvalidCursor(
                "cursor was issued for a different sort_order".to_string(),
            ));
        }
        Ok(())
    }
}
