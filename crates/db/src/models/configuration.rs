//! Configuration models and DTOs.
//!
//! Defines the database row struct for `configurations`, the detail view with
//! group ids and extensions, and the create/update request types.

use concierge_core::configuration::{ConfigurationFields, ConfigurationStatus};
use concierge_core::error::CoreError;
use concierge_core::types::{DbId, StatusId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::extension::Extension;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `configurations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Configuration {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub status_id: StatusId,
    pub agent_name: Option<String>,
    pub chat_footer: Option<String>,
    pub chat_suggestions: Vec<String>,
    pub executor_endpoint: Option<String>,
    pub executor_headers: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Configuration {
    pub fn status(&self) -> Result<ConfigurationStatus, CoreError> {
        ConfigurationStatus::from_id(self.status_id)
    }

    pub fn is_deleted(&self) -> bool {
        self.status_id == ConfigurationStatus::Deleted.id()
    }
}

/// A configuration with its group associations and extensions.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigurationDetail {
    #[serde(flatten)]
    pub configuration: Configuration,
    pub status: ConfigurationStatus,
    pub group_ids: Vec<DbId>,
    pub extensions: Vec<Extension>,
}

impl ConfigurationDetail {
    pub fn new(
        configuration: Configuration,
        group_ids: Vec<DbId>,
        extensions: Vec<Extension>,
    ) -> Result<Self, CoreError> {
        let status = configuration.status()?;
        Ok(Self {
            configuration,
            status,
            group_ids,
            extensions,
        })
    }

    pub fn id(&self) -> DbId {
        self.configuration.id
    }

    /// Current values of every externally-mutable field.
    pub fn fields(&self) -> ConfigurationFields {
        let c = &self.configuration;
        ConfigurationFields {
            name: c.name.clone(),
            description: c.description.clone(),
            status: self.status,
            agent_name: c.agent_name.clone(),
            chat_footer: c.chat_footer.clone(),
            chat_suggestions: c.chat_suggestions.clone(),
            executor_endpoint: c.executor_endpoint.clone(),
            executor_headers: c.executor_headers.clone(),
            group_ids: self.group_ids.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// API request types
// ---------------------------------------------------------------------------

/// Request body for creating a configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateConfiguration {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<ConfigurationStatus>,
    pub agent_name: Option<String>,
    pub chat_footer: Option<String>,
    #[serde(default)]
    pub chat_suggestions: Vec<String>,
    pub executor_endpoint: Option<String>,
    pub executor_headers: Option<serde_json::Value>,
    #[serde(default)]
    pub group_ids: Vec<DbId>,
}

impl From<CreateConfiguration> for ConfigurationFields {
    fn from(input: CreateConfiguration) -> Self {
        Self {
            name: input.name,
            description: input.description,
            status: input.status.unwrap_or(ConfigurationStatus::Enabled),
            agent_name: input.agent_name,
            chat_footer: input.chat_footer,
            chat_suggestions: input.chat_suggestions,
            executor_endpoint: input.executor_endpoint,
            executor_headers: input.executor_headers,
            group_ids: input.group_ids,
        }
    }
}

/// Request body for updating a configuration. Only non-`None` fields are
/// applied; `group_ids`, when present, replaces the whole set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateConfiguration {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ConfigurationStatus>,
    pub agent_name: Option<String>,
    pub chat_footer: Option<String>,
    pub chat_suggestions: Option<Vec<String>>,
    pub executor_endpoint: Option<String>,
    pub executor_headers: Option<serde_json::Value>,
    pub group_ids: Option<Vec<DbId>>,
}

impl UpdateConfiguration {
    /// Overlay the provided fields onto `fields`.
    pub fn apply_to(self, fields: &mut ConfigurationFields) {
        if let Some(name) = self.name {
            fields.name = name;
        }
        if let Some(description) = self.description {
            fields.description = Some(description);
        }
        if let Some(status) = self.status {
            fields.status = status;
        }
        if let Some(agent_name) = self.agent_name {
            fields.agent_name = Some(agent_name);
        }
        if let Some(chat_footer) = self.chat_footer {
            fields.chat_footer = Some(chat_footer);
        }
        if let Some(chat_suggestions) = self.chat_suggestions {
            fields.chat_suggestions = chat_suggestions;
        }
        if let Some(endpoint) = self.executor_endpoint {
            fields.executor_endpoint = Some(endpoint);
        }
        if let Some(headers) = self.executor_headers {
            fields.executor_headers = Some(headers);
        }
        if let Some(group_ids) = self.group_ids {
            fields.group_ids = group_ids;
        }
    }
}

/// Query parameters for listing configurations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigurationListQuery {
    #[serde(default)]
    pub include_deleted: bool,
}
