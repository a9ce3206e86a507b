//! Versioning orchestration shared by the configuration, history, and
//! portable-document handlers.
//!
//! - Snapshot-on-mutation: every committed mutation appends a history entry.
//!   The write is best-effort; a failure is logged and the mutation stands.
//! - Restore: safety snapshot of the live state, then one transaction that
//!   applies the target snapshot.
//! - Export/import of portable documents.

use concierge_core::configuration::{validate_fields, ConfigurationStatus};
use concierge_core::error::CoreError;
use concierge_core::extension_spec::ExtensionRegistry;
use concierge_core::history::{
    normalize_comment, restore_comment, ACTION_CREATE, ACTION_RESTORE,
};
use concierge_core::portable::{self, ImportReport, PortableConfiguration};
use concierge_core::snapshot::SnapshotDocument;
use concierge_core::types::DbId;
use concierge_db::models::configuration::ConfigurationDetail;
use concierge_db::models::extension::{Extension, NewExtension};
use concierge_db::models::history::{ConfigurationHistory, CreateHistoryEntry};
use concierge_db::repositories::{ConfigurationRepo, ExtensionRepo, GroupRepo, HistoryRepo};
use concierge_db::DbPool;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Format version stamped on exports and compared on import.
pub const FORMAT_VERSION: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a configuration with its groups and extensions, including
/// soft-deleted configurations.
pub async fn load_detail(pool: &DbPool, id: DbId) -> AppResult<ConfigurationDetail> {
    let configuration = ConfigurationRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Configuration",
            id,
        }))?;
    let group_ids = GroupRepo::ids_for_configuration(pool, id).await?;
    let extensions = ExtensionRepo::list_by_configuration(pool, id).await?;
    Ok(ConfigurationDetail::new(configuration, group_ids, extensions)?)
}

/// Like [`load_detail`], but a soft-deleted configuration is reported as not
/// found.
pub async fn load_live_detail(pool: &DbPool, id: DbId) -> AppResult<ConfigurationDetail> {
    let detail = load_detail(pool, id).await?;
    if detail.configuration.is_deleted() {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Configuration",
            id,
        }));
    }
    Ok(detail)
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Build the masked snapshot document of a configuration's live state.
pub fn capture(registry: &ExtensionRegistry, detail: &ConfigurationDetail) -> SnapshotDocument {
    let document = SnapshotDocument::capture(
        detail.fields(),
        detail.extensions.iter().map(Extension::to_snapshot).collect(),
        registry,
    );

    let unregistered = document.unregistered_extensions(registry);
    if !unregistered.is_empty() {
        tracing::warn!(
            configuration_id = detail.id(),
            extensions = ?unregistered,
            "Snapshot keeps values of unregistered extension types unmasked",
        );
    }
    document
}

/// Append a history entry holding the current state of `detail`.
pub async fn create_snapshot(
    state: &AppState,
    detail: &ConfigurationDetail,
    actor: Option<DbId>,
    action: &str,
    comment: Option<String>,
) -> AppResult<ConfigurationHistory> {
    let document = capture(&state.registry, detail);
    let snapshot = serde_json::to_value(&document)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize snapshot: {e}")))?;

    let entry = HistoryRepo::create_snapshot(
        &state.pool,
        &CreateHistoryEntry {
            configuration_id: detail.id(),
            action: action.to_string(),
            changed_by: actor,
            snapshot,
            change_comment: comment,
        },
    )
    .await?;

    tracing::info!(
        configuration_id = entry.configuration_id,
        version = entry.version,
        action = %entry.action,
        user_id = ?actor,
        "Configuration snapshot recorded",
    );
    Ok(entry)
}

/// Best-effort [`create_snapshot`]: failures are logged at ERROR and
/// swallowed so the caller's already-committed mutation still succeeds.
pub async fn record_snapshot(
    state: &AppState,
    detail: &ConfigurationDetail,
    actor: Option<DbId>,
    action: &str,
    comment: Option<String>,
) -> Option<ConfigurationHistory> {
    match create_snapshot(state, detail, actor, action, comment).await {
        Ok(entry) => Some(entry),
        Err(err) => {
            tracing::error!(
                configuration_id = detail.id(),
                action,
                error = %err,
                "Failed to record configuration snapshot",
            );
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Restore
// ---------------------------------------------------------------------------

/// Restore a configuration to a historical version.
///
/// Records a safety snapshot of the live state first (best-effort), then
/// applies the target snapshot in one transaction. Group associations are not
/// changed. Secrets come back as masked placeholders and must be re-entered.
pub async fn restore(
    state: &AppState,
    configuration_id: DbId,
    version: i32,
    actor: DbId,
    note: Option<&str>,
) -> AppResult<ConfigurationDetail> {
    let target = HistoryRepo::find_version(&state.pool, configuration_id, version)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ConfigurationVersion",
            id: DbId::from(version),
        }))?;
    let document = target.document().map_err(|e| {
        AppError::InternalError(format!(
            "History entry {} holds a malformed snapshot: {e}",
            target.id
        ))
    })?;

    let current = load_detail(&state.pool, configuration_id).await?;
    let comment = restore_comment(version, normalize_comment(note).as_deref());
    record_snapshot(state, &current, Some(actor), ACTION_RESTORE, Some(comment)).await;

    let unregistered = document.unregistered_extensions(state.registry.as_ref());
    if !unregistered.is_empty() {
        tracing::warn!(
            configuration_id,
            version,
            extensions = ?unregistered,
            "Restoring extensions whose type is no longer registered",
        );
    }

    ConfigurationRepo::restore_snapshot(&state.pool, configuration_id, &document)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Configuration",
            id: configuration_id,
        }))?;

    tracing::info!(
        configuration_id,
        version,
        user_id = actor,
        "Configuration restored",
    );

    load_detail(&state.pool, configuration_id).await
}

// ---------------------------------------------------------------------------
// Duplicate
// ---------------------------------------------------------------------------

/// Copy a live configuration into a new, disabled one named `"{name} (copy)"`.
///
/// Extension values are copied from the live rows, so secrets carry over.
pub async fn duplicate(
    state: &AppState,
    source_id: DbId,
    actor: DbId,
) -> AppResult<ConfigurationDetail> {
    let source = load_live_detail(&state.pool, source_id).await?;

    let mut fields = source.fields();
    fields.name = format!("{} (copy)", fields.name);
    fields.status = ConfigurationStatus::Disabled;
    validate_fields(&fields)?;

    let extensions: Vec<NewExtension> = source.extensions.iter().map(NewExtension::from).collect();
    let created = ConfigurationRepo::create(&state.pool, &fields, &extensions).await?;
    let detail = load_detail(&state.pool, created.id).await?;

    record_snapshot(
        state,
        &detail,
        Some(actor),
        ACTION_CREATE,
        Some(format!("Duplicated from configuration {source_id}")),
    )
    .await;

    tracing::info!(
        configuration_id = created.id,
        source_id,
        user_id = actor,
        "Configuration duplicated",
    );
    Ok(detail)
}

// ---------------------------------------------------------------------------
// Export / import
// ---------------------------------------------------------------------------

/// Result of a successful import.
#[derive(Debug, Serialize)]
pub struct ImportOutcome {
    pub configuration: ConfigurationDetail,
    pub warnings: Vec<String>,
}

/// Export a configuration as a portable document with secrets masked.
pub async fn export(state: &AppState, configuration_id: DbId) -> AppResult<PortableConfiguration> {
    let detail = load_detail(&state.pool, configuration_id).await?;
    Ok(PortableConfiguration::export(
        configuration_id,
        detail.fields(),
        detail.extensions.iter().map(Extension::to_portable).collect(),
        FORMAT_VERSION,
        chrono::Utc::now(),
        state.registry.as_ref(),
    ))
}

/// Run every import check without persisting anything.
pub async fn assess_import(
    state: &AppState,
    document: &PortableConfiguration,
) -> AppResult<ImportReport> {
    let existing = GroupRepo::existing_ids(&state.pool, &document.configuration.group_ids).await?;
    Ok(portable::assess_import(
        document,
        state.registry.as_ref(),
        FORMAT_VERSION,
        &existing,
    ))
}

/// Import a portable document as a brand-new configuration.
///
/// Never overwrites an existing configuration, even when the document carries
/// an origin id. Nothing is persisted unless every check passes.
pub async fn import(
    state: &AppState,
    document: &PortableConfiguration,
    actor: DbId,
) -> AppResult<ImportOutcome> {
    let existing = GroupRepo::existing_ids(&state.pool, &document.configuration.group_ids).await?;
    let plan = portable::plan_import(
        document,
        state.registry.as_ref(),
        FORMAT_VERSION,
        &existing,
    )?;
    for warning in &plan.warnings {
        tracing::warn!(origin_id = ?document.origin_id, %warning, "Import warning");
    }

    let extensions: Vec<NewExtension> = plan.extensions.iter().map(NewExtension::from).collect();
    let created = ConfigurationRepo::create(&state.pool, &plan.configuration, &extensions).await?;
    let detail = load_detail(&state.pool, created.id).await?;

    let comment = match document.origin_id {
        Some(origin) => format!("Imported from configuration {origin}"),
        None => "Imported".to_string(),
    };
    record_snapshot(state, &detail, Some(actor), ACTION_CREATE, Some(comment)).await;

    tracing::info!(
        configuration_id = created.id,
        origin_id = ?document.origin_id,
        extensions = extensions.len(),
        user_id = actor,
        "Configuration imported",
    );

    Ok(ImportOutcome {
        configuration: detail,
        warnings: plan.warnings,
    })
}
