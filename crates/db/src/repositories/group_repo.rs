//! Repository for the `groups` table and `configuration_groups` associations.

use concierge_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::group::Group;

const COLUMNS: &str = "id, name, created_at, updated_at";

/// Group lookups used for access-control associations.
pub struct GroupRepo;

impl GroupRepo {
    /// Insert a group, returning the created row.
    pub async fn create(pool: &PgPool, name: &str) -> Result<Group, sqlx::Error> {
        let query = format!("INSERT INTO groups (name) VALUES ($1) RETURNING {COLUMNS}");
        sqlx::query_as::<_, Group>(&query)
            .bind(name)
            .fetch_one(pool)
            .await
    }

    /// The subset of `ids` that exist, in ascending order.
    pub async fn existing_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<DbId>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<(DbId,)> =
            sqlx::query_as("SELECT id FROM groups WHERE id = ANY($1) ORDER BY id")
                .bind(ids)
                .fetch_all(pool)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Group ids associated with a configuration, ascending.
    pub async fn ids_for_configuration(
        pool: &PgPool,
        configuration_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT group_id FROM configuration_groups \
             WHERE configuration_id = $1 ORDER BY group_id",
        )
        .bind(configuration_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Replace the group set of a configuration. Runs on the caller's
    /// transaction.
    pub(crate) async fn replace_for_configuration(
        conn: &mut PgConnection,
        configuration_id: DbId,
        group_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM configuration_groups WHERE configuration_id = $1")
            .bind(configuration_id)
            .execute(&mut *conn)
            .await?;

        if !group_ids.is_empty() {
            sqlx::query(
                "INSERT INTO configuration_groups (configuration_id, group_id) \
                 SELECT $1, g FROM UNNEST($2::BIGINT[]) AS g \
                 ON CONFLICT ON CONSTRAINT uq_configuration_groups_configuration_group DO NOTHING",
            )
            .bind(configuration_id)
            .bind(group_ids)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }
}
