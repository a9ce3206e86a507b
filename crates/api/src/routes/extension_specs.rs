use axum::routing::get;
use axum::Router;

use crate::handlers::extension_specs;
use crate::state::AppState;

/// Extension spec routes mounted at `/extension-specs`.
///
/// ```text
/// GET /   -> list_extension_specs
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(extension_specs::list_extension_specs))
}
