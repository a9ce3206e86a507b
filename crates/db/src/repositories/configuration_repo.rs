//! Repository for the `configurations` table.
//!
//! Configurations are never physically deleted: soft delete sets the status
//! to `deleted`, and history rows keep referencing the id.

use concierge_core::configuration::{ConfigurationFields, ConfigurationStatus};
use concierge_core::snapshot::SnapshotDocument;
use concierge_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::configuration::Configuration;
use crate::models::extension::NewExtension;
use crate::repositories::{ExtensionRepo, GroupRepo};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, description, status_id, agent_name, chat_footer, \
    chat_suggestions, executor_endpoint, executor_headers, created_at, updated_at";

/// Provides CRUD, restore, and bulk-create operations for configurations.
pub struct ConfigurationRepo;

impl ConfigurationRepo {
    // ── Reads ────────────────────────────────────────────────────────

    /// List configurations ordered by name. Soft-deleted rows are included
    /// only when `include_deleted` is set.
    pub async fn list(
        pool: &PgPool,
        include_deleted: bool,
    ) -> Result<Vec<Configuration>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM configurations
             WHERE ($1 OR status_id <> $2)
             ORDER BY name, id"
        );
        sqlx::query_as::<_, Configuration>(&query)
            .bind(include_deleted)
            .bind(ConfigurationStatus::Deleted.id())
            .fetch_all(pool)
            .await
    }

    /// Find a configuration by id, including soft-deleted rows.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Configuration>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM configurations WHERE id = $1");
        sqlx::query_as::<_, Configuration>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Insert a configuration with its groups and extensions in one
    /// transaction. Extensions without an external id get one derived from
    /// the new configuration id.
    pub async fn create(
        pool: &PgPool,
        fields: &ConfigurationFields,
        extensions: &[NewExtension],
    ) -> Result<Configuration, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO configurations
                (name, description, status_id, agent_name, chat_footer,
                 chat_suggestions, executor_endpoint, executor_headers)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        let configuration = sqlx::query_as::<_, Configuration>(&query)
            .bind(&fields.name)
            .bind(&fields.description)
            .bind(fields.status.id())
            .bind(&fields.agent_name)
            .bind(&fields.chat_footer)
            .bind(&fields.chat_suggestions)
            .bind(&fields.executor_endpoint)
            .bind(&fields.executor_headers)
            .fetch_one(&mut *tx)
            .await?;

        GroupRepo::replace_for_configuration(&mut *tx, configuration.id, &fields.group_ids).await?;
        for ext in extensions {
            ExtensionRepo::insert(&mut *tx, configuration.id, ext).await?;
        }

        tx.commit().await?;
        Ok(configuration)
    }

    /// Overwrite every scalar field and the group set of a live configuration.
    ///
    /// Returns `None` if the configuration does not exist or is soft-deleted.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        fields: &ConfigurationFields,
    ) -> Result<Option<Configuration>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked: Option<(DbId,)> = sqlx::query_as(
            "SELECT id FROM configurations WHERE id = $1 AND status_id <> $2 FOR UPDATE",
        )
        .bind(id)
        .bind(ConfigurationStatus::Deleted.id())
        .fetch_optional(&mut *tx)
        .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let configuration = write_fields(&mut *tx, id, fields).await?;
        GroupRepo::replace_for_configuration(&mut *tx, id, &fields.group_ids).await?;

        tx.commit().await?;
        Ok(Some(configuration))
    }

    /// Soft-delete a configuration. Returns `true` if a live row was marked
    /// deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE configurations SET status_id = $2 WHERE id = $1 AND status_id <> $2",
        )
        .bind(id)
        .bind(ConfigurationStatus::Deleted.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apply a snapshot document to a configuration in one transaction.
    ///
    /// Locks the configuration row, overwrites every scalar field (status
    /// included), then deletes all extensions and recreates them verbatim from
    /// the document. Group associations are left untouched. Returns `None` if
    /// the configuration does not exist.
    pub async fn restore_snapshot(
        pool: &PgPool,
        id: DbId,
        document: &SnapshotDocument,
    ) -> Result<Option<Configuration>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM configurations WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let configuration = write_fields(&mut *tx, id, &document.configuration).await?;

        let removed = ExtensionRepo::delete_all(&mut *tx, id).await?;
        for snapshot in &document.extensions {
            ExtensionRepo::insert(&mut *tx, id, &NewExtension::from(snapshot)).await?;
        }

        tx.commit().await?;

        tracing::debug!(
            configuration_id = id,
            removed,
            recreated = document.extensions.len(),
            "Extensions replaced from snapshot",
        );
        Ok(Some(configuration))
    }
}

/// Overwrite the scalar fields of a configuration row on the caller's
/// transaction.
async fn write_fields(
    conn: &mut PgConnection,
    id: DbId,
    fields: &ConfigurationFields,
) -> Result<Configuration, sqlx::Error> {
    let query = format!(
        "UPDATE configurations SET
            name = $2,
            description = $3,
            status_id = $4,
            agent_name = $5,
            chat_footer = $6,
            chat_suggestions = $7,
            executor_endpoint = $8,
            executor_headers = $9
         WHERE id = $1
         RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, Configuration>(&query)
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.status.id())
        .bind(&fields.agent_name)
        .bind(&fields.chat_footer)
        .bind(&fields.chat_suggestions)
        .bind(&fields.executor_endpoint)
        .bind(&fields.executor_headers)
        .fetch_one(&mut *conn)
        .await
}
