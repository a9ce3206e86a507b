//! Repository for the `extensions` table.
//!
//! Rows are always scoped by their owning configuration so an extension id
//! from another configuration never matches.

use concierge_core::configuration::extension_external_id;
use concierge_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::extension::{Extension, NewExtension, UpdateExtension};

/// Column list for `extensions` queries.
const COLUMNS: &str = "\
    id, configuration_id, external_id, name, enabled, values_json, \
    state_json, configurable_arguments_json, created_at, updated_at";

/// Provides CRUD operations for extension instances.
pub struct ExtensionRepo;

impl ExtensionRepo {
    /// List a configuration's extensions in insertion order.
    pub async fn list_by_configuration(
        pool: &PgPool,
        configuration_id: DbId,
    ) -> Result<Vec<Extension>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM extensions WHERE configuration_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, Extension>(&query)
            .bind(configuration_id)
            .fetch_all(pool)
            .await
    }

    /// Find an extension of a configuration by its internal id.
    pub async fn find(
        pool: &PgPool,
        configuration_id: DbId,
        id: DbId,
    ) -> Result<Option<Extension>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM extensions WHERE id = $1 AND configuration_id = $2"
        );
        sqlx::query_as::<_, Extension>(&query)
            .bind(id)
            .bind(configuration_id)
            .fetch_optional(pool)
            .await
    }

    /// Attach a new extension to a configuration.
    pub async fn create(
        pool: &PgPool,
        configuration_id: DbId,
        input: &NewExtension,
    ) -> Result<Extension, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::insert(&mut *conn, configuration_id, input).await
    }

    /// Update an extension. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        configuration_id: DbId,
        id: DbId,
        input: &UpdateExtension,
    ) -> Result<Option<Extension>, sqlx::Error> {
        let values = input.values.clone().map(serde_json::Value::Object);
        let query = format!(
            "UPDATE extensions SET
                enabled = COALESCE($3, enabled),
                values_json = COALESCE($4, values_json),
                state_json = COALESCE($5, state_json),
                configurable_arguments_json = COALESCE($6, configurable_arguments_json)
             WHERE id = $1 AND configuration_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Extension>(&query)
            .bind(id)
            .bind(configuration_id)
            .bind(input.enabled)
            .bind(values)
            .bind(&input.state)
            .bind(&input.configurable_arguments)
            .fetch_optional(pool)
            .await
    }

    /// Remove an extension. Returns `true` if a row was deleted.
    pub async fn delete(
        pool: &PgPool,
        configuration_id: DbId,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM extensions WHERE id = $1 AND configuration_id = $2")
            .bind(id)
            .bind(configuration_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Insert one extension on the caller's connection or transaction.
    pub(crate) async fn insert(
        conn: &mut PgConnection,
        configuration_id: DbId,
        input: &NewExtension,
    ) -> Result<Extension, sqlx::Error> {
        let external_id = input
            .external_id
            .clone()
            .unwrap_or_else(|| extension_external_id(configuration_id, &input.name));
        let query = format!(
            "INSERT INTO extensions
                (configuration_id, external_id, name, enabled, values_json,
                 state_json, configurable_arguments_json)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Extension>(&query)
            .bind(configuration_id)
            .bind(external_id)
            .bind(&input.name)
            .bind(input.enabled)
            .bind(serde_json::Value::Object(input.values.clone()))
            .bind(&input.state)
            .bind(&input.configurable_arguments)
            .fetch_one(&mut *conn)
            .await
    }

    /// Delete every extension of a configuration on the caller's transaction.
    pub(crate) async fn delete_all(
        conn: &mut PgConnection,
        configuration_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM extensions WHERE configuration_id = $1")
            .bind(configuration_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}
