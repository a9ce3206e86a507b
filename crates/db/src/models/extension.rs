//! Extension instance models and DTOs.

use concierge_core::portable::PortableExtension;
use concierge_core::snapshot::ExtensionSnapshot;
use concierge_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `extensions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Extension {
    pub id: DbId,
    pub configuration_id: DbId,
    pub external_id: String,
    pub name: String,
    pub enabled: bool,
    pub values_json: Value,
    pub state_json: Option<Value>,
    pub configurable_arguments_json: Option<Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Extension {
    /// The value map. A non-object column value reads as empty.
    pub fn values(&self) -> Map<String, Value> {
        self.values_json.as_object().cloned().unwrap_or_default()
    }

    /// Unmasked snapshot of this row. Masking happens when the document is
    /// captured.
    pub fn to_snapshot(&self) -> ExtensionSnapshot {
        ExtensionSnapshot {
            external_id: self.external_id.clone(),
            name: self.name.clone(),
            enabled: self.enabled,
            values: self.values(),
            state: self.state_json.clone(),
            configurable_arguments: self.configurable_arguments_json.clone(),
        }
    }

    pub fn to_portable(&self) -> PortableExtension {
        PortableExtension {
            name: self.name.clone(),
            enabled: self.enabled,
            values: self.values(),
            configurable_arguments: self.configurable_arguments_json.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Insert payload
// ---------------------------------------------------------------------------

/// Extension row to insert.
///
/// `external_id` is derived from the owning configuration when `None`.
#[derive(Debug, Clone)]
pub struct NewExtension {
    pub external_id: Option<String>,
    pub name: String,
    pub enabled: bool,
    pub values: Map<String, Value>,
    pub state: Option<Value>,
    pub configurable_arguments: Option<Value>,
}

impl From<&ExtensionSnapshot> for NewExtension {
    fn from(snapshot: &ExtensionSnapshot) -> Self {
        Self {
            external_id: Some(snapshot.external_id.clone()),
            name: snapshot.name.clone(),
            enabled: snapshot.enabled,
            values: snapshot.values.clone(),
            state: snapshot.state.clone(),
            configurable_arguments: snapshot.configurable_arguments.clone(),
        }
    }
}

impl From<&PortableExtension> for NewExtension {
    fn from(ext: &PortableExtension) -> Self {
        Self {
            external_id: None,
            name: ext.name.clone(),
            enabled: ext.enabled,
            values: ext.values.clone(),
            state: None,
            configurable_arguments: ext.configurable_arguments.clone(),
        }
    }
}

impl From<&Extension> for NewExtension {
    /// Copy of an existing row for another configuration (fresh external id).
    fn from(ext: &Extension) -> Self {
        Self {
            external_id: None,
            name: ext.name.clone(),
            enabled: ext.enabled,
            values: ext.values(),
            state: ext.state_json.clone(),
            configurable_arguments: ext.configurable_arguments_json.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// API request types
// ---------------------------------------------------------------------------

/// Request body for attaching an extension to a configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateExtension {
    pub name: String,
    pub enabled: Option<bool>,
    #[serde(default)]
    pub values: Map<String, Value>,
    pub state: Option<Value>,
    pub configurable_arguments: Option<Value>,
}

impl From<CreateExtension> for NewExtension {
    fn from(input: CreateExtension) -> Self {
        Self {
            external_id: None,
            name: input.name,
            enabled: input.enabled.unwrap_or(true),
            values: input.values,
            state: input.state,
            configurable_arguments: input.configurable_arguments,
        }
    }
}

/// Request body for updating an extension. Only non-`None` fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateExtension {
    pub enabled: Option<bool>,
    pub values: Option<Map<String, Value>>,
    pub state: Option<Value>,
    pub configurable_arguments: Option<Value>,
}
