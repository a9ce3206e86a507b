//! Route definitions for the cross-configuration history feeds.

use axum::routing::get;
use axum::Router;

use crate::handlers::history;
use crate::state::AppState;

/// History routes mounted at `/history`.
///
/// ```text
/// GET /recent               -> list_recent
/// GET /by-actor/{user_id}   -> list_by_actor
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recent", get(history::list_recent))
        .route("/by-actor/{user_id}", get(history::list_by_actor))
}
