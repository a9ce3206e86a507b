//! Read-only access to the extension spec registry.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /extension-specs
pub async fn list_extension_specs(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(DataResponse {
        data: state.registry.list().into_iter().cloned().collect::<Vec<_>>(),
    }))
}
