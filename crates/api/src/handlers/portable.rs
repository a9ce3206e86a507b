//! Handlers for exporting and importing portable configuration documents.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use concierge_core::portable::PortableConfiguration;
use concierge_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::versioning;

/// GET /configurations/{id}/export
///
/// Secret argument values are masked in the document.
pub async fn export_configuration(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let document = versioning::export(&state, id).await?;

    tracing::info!(
        configuration_id = id,
        extensions = document.extensions.len(),
        user_id = admin.user_id,
        "Configuration exported",
    );

    Ok(Json(DataResponse { data: document }))
}

/// POST /configurations/import/validate
///
/// Dry run: reports every problem without persisting anything.
pub async fn validate_import(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(document): Json<PortableConfiguration>,
) -> AppResult<impl IntoResponse> {
    let report = versioning::assess_import(&state, &document).await?;
    Ok(Json(DataResponse { data: report }))
}

/// POST /configurations/import
pub async fn import_configuration(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(document): Json<PortableConfiguration>,
) -> AppResult<impl IntoResponse> {
    let outcome = versioning::import(&state, &document, admin.user_id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: outcome })))
}
