//! Repository for the `configuration_history` table.
//!
//! The table is append-only. Versions are allocated per configuration inside
//! one transaction holding a Postgres advisory lock keyed on the configuration
//! id, so concurrent writers (in any process) receive gapless, strictly
//! increasing versions.

use concierge_core::types::DbId;
use sqlx::PgPool;

use crate::models::history::{ConfigurationHistory, CreateHistoryEntry};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, configuration_id, version, action, changed_by, \
    snapshot, change_comment, created_at, updated_at";

/// Provides append and lookup operations for configuration history.
pub struct HistoryRepo;

impl HistoryRepo {
    /// Append a history entry with the next version for its configuration.
    ///
    /// A `changed_by` id with no matching user is stored as NULL rather than
    /// failing the write.
    pub async fn create_snapshot(
        pool: &PgPool,
        input: &CreateHistoryEntry,
    ) -> Result<ConfigurationHistory, sqlx::Error> {
        let mut tx = pool.begin().await?;

        // Serialize allocators for this configuration until commit.
        sqlx::query(
            "SELECT pg_advisory_xact_lock(\
                hashtextextended('configuration_history:' || $1::text, 0))",
        )
        .bind(input.configuration_id)
        .execute(&mut *tx)
        .await?;

        let next: (i32,) = sqlx::query_as(
            "SELECT COALESCE(MAX(version), 0) + 1 \
             FROM configuration_history WHERE configuration_id = $1",
        )
        .bind(input.configuration_id)
        .fetch_one(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO configuration_history
                (configuration_id, version, action, changed_by, snapshot, change_comment)
             VALUES ($1, $2, $3, (SELECT id FROM users WHERE id = $4), $5, $6)
             RETURNING {COLUMNS}"
        );
        let entry = sqlx::query_as::<_, ConfigurationHistory>(&query)
            .bind(input.configuration_id)
            .bind(next.0)
            .bind(&input.action)
            .bind(input.changed_by)
            .bind(&input.snapshot)
            .bind(&input.change_comment)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(
            configuration_id = entry.configuration_id,
            version = entry.version,
            action = %entry.action,
            "History version allocated",
        );
        Ok(entry)
    }

    /// All entries for a configuration, newest version first.
    pub async fn list_by_configuration(
        pool: &PgPool,
        configuration_id: DbId,
    ) -> Result<Vec<ConfigurationHistory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM configuration_history
             WHERE configuration_id = $1
             ORDER BY version DESC"
        );
        sqlx::query_as::<_, ConfigurationHistory>(&query)
            .bind(configuration_id)
            .fetch_all(pool)
            .await
    }

    /// Find one version of a configuration.
    pub async fn find_version(
        pool: &PgPool,
        configuration_id: DbId,
        version: i32,
    ) -> Result<Option<ConfigurationHistory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM configuration_history
             WHERE configuration_id = $1 AND version = $2"
        );
        sqlx::query_as::<_, ConfigurationHistory>(&query)
            .bind(configuration_id)
            .bind(version)
            .fetch_optional(pool)
            .await
    }

    /// The highest version of a configuration, if any exists.
    pub async fn find_latest(
        pool: &PgPool,
        configuration_id: DbId,
    ) -> Result<Option<ConfigurationHistory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM configuration_history
             WHERE configuration_id = $1
             ORDER BY version DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, ConfigurationHistory>(&query)
            .bind(configuration_id)
            .fetch_optional(pool)
            .await
    }

    /// Most recent entries across all configurations.
    pub async fn list_recent(
        pool: &PgPool,
        limit: i64,
    ) -> Result<Vec<ConfigurationHistory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM configuration_history
             ORDER BY created_at DESC, id DESC
             LIMIT $1"
        );
        sqlx::query_as::<_, ConfigurationHistory>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Entries written by one actor, newest first.
    pub async fn list_by_actor(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<ConfigurationHistory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM configuration_history
             WHERE changed_by = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, ConfigurationHistory>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
