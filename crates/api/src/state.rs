use std::sync::Arc;

use concierge_core::extension_spec::ExtensionRegistry;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: inner data is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: concierge_db::DbPool,
    /// Server configuration (JWT settings are read by the auth extractor).
    pub config: Arc<ServerConfig>,
    /// Extension specs loaded at startup. Read-only for the process lifetime.
    pub registry: Arc<ExtensionRegistry>,
}
