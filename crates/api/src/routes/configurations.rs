//! Route definitions for configurations and everything hanging off one.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{configurations, extensions, history, portable};
use crate::state::AppState;

/// Configuration routes mounted at `/configurations`.
///
/// ```text
/// GET    /                                  -> list_configurations
/// POST   /                                  -> create_configuration
/// POST   /import                            -> import_configuration
/// POST   /import/validate                   -> validate_import
/// GET    /{id}                              -> get_configuration
/// PUT    /{id}                              -> update_configuration
/// DELETE /{id}                              -> delete_configuration
/// POST   /{id}/duplicate                    -> duplicate_configuration
/// GET    /{id}/export                       -> export_configuration
/// POST   /{id}/extensions                   -> create_extension
/// PUT    /{id}/extensions/{extension_id}    -> update_extension
/// DELETE /{id}/extensions/{extension_id}    -> delete_extension
/// GET    /{id}/history                      -> list_history
/// GET    /{id}/history/latest               -> get_latest
/// GET    /{id}/history/compare              -> compare_versions
/// GET    /{id}/history/{version}            -> get_version
/// POST   /{id}/history/{version}/restore    -> restore_version
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(configurations::list_configurations).post(configurations::create_configuration),
        )
        .route("/import", post(portable::import_configuration))
        .route("/import/validate", post(portable::validate_import))
        .route(
            "/{id}",
            get(configurations::get_configuration)
                .put(configurations::update_configuration)
                .delete(configurations::delete_configuration),
        )
        .route("/{id}/duplicate", post(configurations::duplicate_configuration))
        .route("/{id}/export", get(portable::export_configuration))
        .route("/{id}/extensions", post(extensions::create_extension))
        .route(
            "/{id}/extensions/{extension_id}",
            put(extensions::update_extension).delete(extensions::delete_extension),
        )
        .route("/{id}/history", get(history::list_history))
        .route("/{id}/history/latest", get(history::get_latest))
        .route("/{id}/history/compare", get(history::compare_versions))
        .route("/{id}/history/{version}", get(history::get_version))
        .route("/{id}/history/{version}/restore", post(history::restore_version))
}
