//! Handlers for the extensions attached to a configuration.
//!
//! Values are validated against the registered spec of the extension type.
//! Each change appends an `update` history entry for the owning
//! configuration.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use concierge_core::arguments::validate_extension_values;
use concierge_core::error::CoreError;
use concierge_core::extension_spec::{ExtensionSpec, SpecLookup};
use concierge_core::history::ACTION_UPDATE;
use concierge_core::types::DbId;
use concierge_db::models::extension::{CreateExtension, NewExtension, UpdateExtension};
use concierge_db::repositories::ExtensionRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::versioning;

fn lookup_spec<'a>(state: &'a AppState, name: &str) -> AppResult<&'a ExtensionSpec> {
    state.registry.spec(name).ok_or_else(|| {
        AppError::Core(CoreError::Validation(format!(
            "Unknown extension type '{name}'"
        )))
    })
}

/// Append an `update` history entry for the configuration owning an
/// extension. Best-effort, like every post-commit snapshot.
async fn snapshot_owner(state: &AppState, configuration_id: DbId, actor: DbId) {
    match versioning::load_detail(&state.pool, configuration_id).await {
        Ok(detail) => {
            versioning::record_snapshot(state, &detail, Some(actor), ACTION_UPDATE, None).await;
        }
        Err(err) => tracing::error!(
            configuration_id,
            error = %err,
            "Failed to load configuration for snapshot",
        ),
    }
}

/// POST /configurations/{id}/extensions
pub async fn create_extension(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(configuration_id): Path<DbId>,
    Json(input): Json<CreateExtension>,
) -> AppResult<impl IntoResponse> {
    versioning::load_live_detail(&state.pool, configuration_id).await?;
    let spec = lookup_spec(&state, &input.name)?;
    validate_extension_values(&input.values, spec)?;

    let extension =
        ExtensionRepo::create(&state.pool, configuration_id, &NewExtension::from(input)).await?;
    snapshot_owner(&state, configuration_id, admin.user_id).await;

    tracing::info!(
        configuration_id,
        extension_id = extension.id,
        extension = %extension.name,
        user_id = admin.user_id,
        "Extension added",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: extension })))
}

/// PUT /configurations/{id}/extensions/{extension_id}
///
/// New values are validated only while the extension type is registered.
pub async fn update_extension(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path((configuration_id, extension_id)): Path<(DbId, DbId)>,
    Json(input): Json<UpdateExtension>,
) -> AppResult<impl IntoResponse> {
    versioning::load_live_detail(&state.pool, configuration_id).await?;
    let current = ExtensionRepo::find(&state.pool, configuration_id, extension_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Extension",
            id: extension_id,
        }))?;

    if let Some(values) = &input.values {
        match state.registry.spec(&current.name) {
            Some(spec) => validate_extension_values(values, spec)?,
            None => tracing::warn!(
                configuration_id,
                extension = %current.name,
                "Updating values of an unregistered extension type without validation",
            ),
        }
    }

    let extension = ExtensionRepo::update(&state.pool, configuration_id, extension_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Extension",
            id: extension_id,
        }))?;
    snapshot_owner(&state, configuration_id, admin.user_id).await;

    tracing::info!(
        configuration_id,
        extension_id,
        user_id = admin.user_id,
        "Extension updated",
    );

    Ok(Json(DataResponse { data: extension }))
}

/// DELETE /configurations/{id}/extensions/{extension_id}
pub async fn delete_extension(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path((configuration_id, extension_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    versioning::load_live_detail(&state.pool, configuration_id).await?;
    let deleted = ExtensionRepo::delete(&state.pool, configuration_id, extension_id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Extension",
            id: extension_id,
        }));
    }
    snapshot_owner(&state, configuration_id, admin.user_id).await;

    tracing::info!(
        configuration_id,
        extension_id,
        user_id = admin.user_id,
        "Extension removed",
    );

    Ok(StatusCode::NO_CONTENT)
}
