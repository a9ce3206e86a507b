pub mod configurations;
pub mod extension_specs;
pub mod health;
pub mod history;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree. Every route requires an admin token.
///
/// Route hierarchy:
///
/// ```text
/// /configurations                                     list, create
/// /configurations/import                              import document (POST)
/// /configurations/import/validate                     dry-run import (POST)
/// /configurations/{id}                                get, update, soft delete
/// /configurations/{id}/duplicate                      copy as disabled (POST)
/// /configurations/{id}/export                         portable document (GET)
/// /configurations/{id}/extensions                     add extension (POST)
/// /configurations/{id}/extensions/{extension_id}      update, remove
/// /configurations/{id}/history                        all versions, newest first
/// /configurations/{id}/history/latest                 latest version
/// /configurations/{id}/history/compare?from=&to=      two versions side by side
/// /configurations/{id}/history/{version}              one version
/// /configurations/{id}/history/{version}/restore      restore (POST)
///
/// /history/recent?limit=                              recent changes, all configurations
/// /history/by-actor/{user_id}                         changes made by one user
///
/// /extension-specs                                    registered extension types
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/configurations", configurations::router())
        .nest("/history", history::router())
        .nest("/extension-specs", extension_specs::router())
}
