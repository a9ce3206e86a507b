//! Assistant configuration lifecycle status and the externally-mutable field
//! set shared by history snapshots and portable documents.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, StatusId};

/// Maximum length of a configuration name, in characters.
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum number of chat suggestions a configuration may carry.
pub const MAX_CHAT_SUGGESTIONS: usize = 20;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Configuration lifecycle status.
///
/// Discriminants match the seed rows of the `configuration_statuses` lookup
/// table. `Deleted` is a soft-delete marker; rows are never removed.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigurationStatus {
    Enabled = 1,
    Disabled = 2,
    Deleted = 3,
}

impl ConfigurationStatus {
    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Map a `configuration_statuses.id` back to the enum.
    pub fn from_id(id: StatusId) -> Result<Self, CoreError> {
        match id {
            1 => Ok(Self::Enabled),
            2 => Ok(Self::Disabled),
            3 => Ok(Self::Deleted),
            other => Err(CoreError::Internal(format!(
                "Unknown configuration status id {other}"
            ))),
        }
    }

    /// Status a newly imported configuration receives.
    ///
    /// Only an explicitly enabled document imports as enabled; a deleted
    /// configuration never comes back to life as deleted.
    pub fn for_import(self) -> Self {
        match self {
            Self::Enabled => Self::Enabled,
            Self::Disabled | Self::Deleted => Self::Disabled,
        }
    }
}

impl From<ConfigurationStatus> for StatusId {
    fn from(value: ConfigurationStatus) -> Self {
        value as StatusId
    }
}

// ---------------------------------------------------------------------------
// Field set
// ---------------------------------------------------------------------------

/// Every externally-mutable field of a configuration.
///
/// Embedded (flattened) in both [`crate::snapshot::SnapshotDocument`] and
/// [`crate::portable::PortableConfiguration`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationFields {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: ConfigurationStatus,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub chat_footer: Option<String>,
    #[serde(default)]
    pub chat_suggestions: Vec<String>,
    #[serde(default)]
    pub executor_endpoint: Option<String>,
    #[serde(default)]
    pub executor_headers: Option<serde_json::Value>,
    #[serde(default)]
    pub group_ids: Vec<DbId>,
}

/// Stable external identifier of an extension instance within a configuration.
pub fn extension_external_id(configuration_id: DbId, extension_name: &str) -> String {
    format!("{configuration_id}-{extension_name}")
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a configuration name.
pub fn validate_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation(
            "Configuration name must not be empty".into(),
        ));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Configuration name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate the chat suggestion list.
pub fn validate_chat_suggestions(suggestions: &[String]) -> Result<(), CoreError> {
    if suggestions.len() > MAX_CHAT_SUGGESTIONS {
        return Err(CoreError::Validation(format!(
            "At most {MAX_CHAT_SUGGESTIONS} chat suggestions are allowed"
        )));
    }
    if suggestions.iter().any(|s| s.trim().is_empty()) {
        return Err(CoreError::Validation(
            "Chat suggestions must not be empty".into(),
        ));
    }
    Ok(())
}

/// Executor headers, when present, must be a flat object of string values.
pub fn validate_executor_headers(headers: Option<&serde_json::Value>) -> Result<(), CoreError> {
    let Some(headers) = headers else {
        return Ok(());
    };
    let map = headers.as_object().ok_or_else(|| {
        CoreError::Validation("executor_headers must be a JSON object".into())
    })?;
    if let Some((key, _)) = map.iter().find(|(_, v)| !v.is_string()) {
        return Err(CoreError::Validation(format!(
            "executor_headers.{key} must be a string"
        )));
    }
    Ok(())
}

/// Validate every scalar field of a candidate configuration.
pub fn validate_fields(fields: &ConfigurationFields) -> Result<(), CoreError> {
    validate_name(&fields.name)?;
    validate_chat_suggestions(&fields.chat_suggestions)?;
    validate_executor_headers(fields.executor_headers.as_ref())
}
