//! Handlers for configuration version history and restore.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use concierge_core::error::CoreError;
use concierge_core::history::{clamp_limit, DEFAULT_RECENT_LIMIT, MAX_RECENT_LIMIT};
use concierge_core::types::DbId;
use concierge_db::models::history::{
    CompareQuery, ConfigurationHistory, HistoryComparison, RecentHistoryQuery, RestoreRequest,
};
use concierge_db::repositories::{ConfigurationRepo, HistoryRepo};
use concierge_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::versioning;

async fn ensure_version_exists(
    pool: &DbPool,
    configuration_id: DbId,
    version: i32,
) -> AppResult<ConfigurationHistory> {
    HistoryRepo::find_version(pool, configuration_id, version)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ConfigurationVersion",
            id: DbId::from(version),
        }))
}

/// GET /configurations/{id}/history
pub async fn list_history(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(configuration_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ConfigurationRepo::find_by_id(&state.pool, configuration_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Configuration",
            id: configuration_id,
        }))?;
    let entries = HistoryRepo::list_by_configuration(&state.pool, configuration_id).await?;
    Ok(Json(DataResponse { data: entries }))
}

/// GET /configurations/{id}/history/latest
pub async fn get_latest(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(configuration_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let entry = HistoryRepo::find_latest(&state.pool, configuration_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ConfigurationHistory",
            id: configuration_id,
        }))?;
    Ok(Json(DataResponse { data: entry }))
}

/// GET /configurations/{id}/history/{version}
pub async fn get_version(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path((configuration_id, version)): Path<(DbId, i32)>,
) -> AppResult<impl IntoResponse> {
    let entry = ensure_version_exists(&state.pool, configuration_id, version).await?;
    Ok(Json(DataResponse { data: entry }))
}

/// GET /configurations/{id}/history/compare?from=&to=
///
/// Returns both entries verbatim; diffing is left to the client.
pub async fn compare_versions(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(configuration_id): Path<DbId>,
    Query(params): Query<CompareQuery>,
) -> AppResult<impl IntoResponse> {
    let from = ensure_version_exists(&state.pool, configuration_id, params.from).await?;
    let to = ensure_version_exists(&state.pool, configuration_id, params.to).await?;
    Ok(Json(DataResponse {
        data: HistoryComparison { from, to },
    }))
}

/// POST /configurations/{id}/history/{version}/restore
///
/// The body is optional; `{ "comment": "..." }` is appended to the safety
/// snapshot's comment.
pub async fn restore_version(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path((configuration_id, version)): Path<(DbId, i32)>,
    input: Option<Json<RestoreRequest>>,
) -> AppResult<impl IntoResponse> {
    let input = input.map(|Json(body)| body).unwrap_or_default();
    let detail = versioning::restore(
        &state,
        configuration_id,
        version,
        admin.user_id,
        input.comment.as_deref(),
    )
    .await?;
    Ok(Json(DataResponse { data: detail }))
}

/// GET /history/recent?limit=
pub async fn list_recent(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<RecentHistoryQuery>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_limit(params.limit, DEFAULT_RECENT_LIMIT, MAX_RECENT_LIMIT);
    let entries = HistoryRepo::list_recent(&state.pool, limit).await?;
    Ok(Json(DataResponse { data: entries }))
}

/// GET /history/by-actor/{user_id}
pub async fn list_by_actor(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let entries = HistoryRepo::list_by_actor(&state.pool, user_id).await?;
    Ok(Json(DataResponse { data: entries }))
}
