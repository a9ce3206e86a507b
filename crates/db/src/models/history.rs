//! Configuration history models and DTOs.

use concierge_core::snapshot::SnapshotDocument;
use concierge_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `configuration_history` table. Rows are never updated.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ConfigurationHistory {
    pub id: DbId,
    pub configuration_id: DbId,
    pub version: i32,
    pub action: String,
    pub changed_by: Option<DbId>,
    pub snapshot: serde_json::Value,
    pub change_comment: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ConfigurationHistory {
    /// Parse the stored snapshot document.
    pub fn document(&self) -> Result<SnapshotDocument, serde_json::Error> {
        serde_json::from_value(self.snapshot.clone())
    }
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// Input for appending a history entry. The version is allocated by the
/// repository.
#[derive(Debug, Clone)]
pub struct CreateHistoryEntry {
    pub configuration_id: DbId,
    pub action: String,
    pub changed_by: Option<DbId>,
    pub snapshot: serde_json::Value,
    pub change_comment: Option<String>,
}

// ---------------------------------------------------------------------------
// API request / response types
// ---------------------------------------------------------------------------

/// Optional body of a restore request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestoreRequest {
    pub comment: Option<String>,
}

/// Query parameters for comparing two versions.
#[derive(Debug, Clone, Deserialize)]
pub struct CompareQuery {
    pub from: i32,
    pub to: i32,
}

/// Two history entries side by side.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryComparison {
    pub from: ConfigurationHistory,
    pub to: ConfigurationHistory,
}

/// Query parameters for the recent-changes feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecentHistoryQuery {
    pub limit: Option<i64>,
}
