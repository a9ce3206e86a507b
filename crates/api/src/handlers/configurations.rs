//! Handlers for configuration CRUD.
//!
//! Every successful mutation appends a history entry after it commits.

use std::collections::BTreeSet;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use concierge_core::configuration::{validate_fields, ConfigurationFields, ConfigurationStatus};
use concierge_core::error::CoreError;
use concierge_core::history::{ACTION_CREATE, ACTION_DELETE, ACTION_UPDATE};
use concierge_core::types::DbId;
use concierge_db::models::configuration::{
    ConfigurationListQuery, CreateConfiguration, UpdateConfiguration,
};
use concierge_db::repositories::{ConfigurationRepo, GroupRepo};
use concierge_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::versioning;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Reject group ids that do not exist.
async fn ensure_groups_exist(pool: &DbPool, group_ids: &[DbId]) -> AppResult<()> {
    let existing = GroupRepo::existing_ids(pool, group_ids).await?;
    let missing: Vec<String> = group_ids
        .iter()
        .filter(|id| !existing.contains(id))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|id| id.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Unknown group ids: {}",
            missing.join(", ")
        ))));
    }
    Ok(())
}

async fn check_fields(pool: &DbPool, fields: &ConfigurationFields) -> AppResult<()> {
    validate_fields(fields)?;
    ensure_groups_exist(pool, &fields.group_ids).await
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /configurations
pub async fn list_configurations(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<ConfigurationListQuery>,
) -> AppResult<impl IntoResponse> {
    let items = ConfigurationRepo::list(&state.pool, params.include_deleted).await?;
    Ok(Json(DataResponse { data: items }))
}

/// GET /configurations/{id}
pub async fn get_configuration(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let detail = versioning::load_detail(&state.pool, id).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// POST /configurations
pub async fn create_configuration(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateConfiguration>,
) -> AppResult<impl IntoResponse> {
    let fields = ConfigurationFields::from(input);
    if fields.status == ConfigurationStatus::Deleted {
        return Err(AppError::BadRequest(
            "A configuration cannot be created as deleted".into(),
        ));
    }
    check_fields(&state.pool, &fields).await?;

    let created = ConfigurationRepo::create(&state.pool, &fields, &[]).await?;
    let detail = versioning::load_detail(&state.pool, created.id).await?;
    versioning::record_snapshot(&state, &detail, Some(admin.user_id), ACTION_CREATE, None).await;

    tracing::info!(
        configuration_id = created.id,
        user_id = admin.user_id,
        "Configuration created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: detail })))
}

/// PUT /configurations/{id}
///
/// Deleted configurations cannot be updated; use the restore endpoint to
/// bring one back.
pub async fn update_configuration(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateConfiguration>,
) -> AppResult<impl IntoResponse> {
    if input.status == Some(ConfigurationStatus::Deleted) {
        return Err(AppError::BadRequest(
            "Use DELETE to delete a configuration".into(),
        ));
    }

    let current = versioning::load_live_detail(&state.pool, id).await?;
    let mut fields = current.fields();
    input.apply_to(&mut fields);
    check_fields(&state.pool, &fields).await?;

    ConfigurationRepo::update(&state.pool, id, &fields)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Configuration",
            id,
        }))?;
    let detail = versioning::load_detail(&state.pool, id).await?;
    versioning::record_snapshot(&state, &detail, Some(admin.user_id), ACTION_UPDATE, None).await;

    tracing::info!(configuration_id = id, user_id = admin.user_id, "Configuration updated");

    Ok(Json(DataResponse { data: detail }))
}

/// DELETE /configurations/{id}
///
/// Soft delete: the row and its history stay.
pub async fn delete_configuration(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let deleted = ConfigurationRepo::soft_delete(&state.pool, id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Configuration",
            id,
        }));
    }

    let detail = versioning::load_detail(&state.pool, id).await?;
    versioning::record_snapshot(&state, &detail, Some(admin.user_id), ACTION_DELETE, None).await;

    tracing::info!(configuration_id = id, user_id = admin.user_id, "Configuration deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /configurations/{id}/duplicate
pub async fn duplicate_configuration(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let detail = versioning::duplicate(&state, id, admin.user_id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: detail })))
}
