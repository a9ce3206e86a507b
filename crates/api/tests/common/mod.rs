#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use concierge_api::auth::jwt::{generate_access_token, JwtConfig};
use concierge_api::config::ServerConfig;
use concierge_api::router::build_app_router;
use concierge_api::state::AppState;
use concierge_core::extension_spec::ExtensionRegistry;
use concierge_core::roles::{ROLE_ADMIN, ROLE_USER};

/// Registry used by every API test.
///
/// - `rag-tool`: required `endpoint`, required secret `apiKey`
/// - `web-search`: optional secret `apiKey`
/// - `calculator`: no arguments
pub const TEST_SPECS: &str = r#"[
    {
        "name": "rag-tool",
        "arguments": {
            "endpoint": { "type": "string", "required": true },
            "apiKey": { "type": "string", "format": "password", "required": true }
        }
    },
    {
        "name": "web-search",
        "arguments": {
            "apiKey": { "type": "string", "format": "password" },
            "maxResults": { "type": "integer", "minimum": 1, "maximum": 50 }
        }
    },
    { "name": "calculator" }
]"#;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-jwt-secret".to_string(),
            access_token_expiry_mins: 15,
        },
        max_body_bytes: 64 * 1024,
        extension_specs_path: None,
    }
}

pub fn test_registry() -> ExtensionRegistry {
    ExtensionRegistry::from_json_str(TEST_SPECS).expect("test specs should parse")
}

/// Build the full application router on the given pool, with the same
/// middleware stack production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        registry: Arc::new(test_registry()),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Users and tokens
// ---------------------------------------------------------------------------

pub async fn create_user(pool: &PgPool, username: &str, role: &str) -> i64 {
    let (id,): (i64,) =
        sqlx::query_as("INSERT INTO users (username, role) VALUES ($1, $2) RETURNING id")
            .bind(username)
            .bind(role)
            .fetch_one(pool)
            .await
            .expect("user insert should succeed");
    id
}

pub fn token_for(user_id: i64, role: &str) -> String {
    generate_access_token(user_id, role, &test_config().jwt).expect("token should encode")
}

/// Create an admin user and return its id and an access token.
pub async fn admin_token(pool: &PgPool) -> (i64, String) {
    let id = create_user(pool, "admin", ROLE_ADMIN).await;
    (id, token_for(id, ROLE_ADMIN))
}

/// Create a non-admin user and return an access token.
pub async fn user_token(pool: &PgPool) -> String {
    let id = create_user(pool, "viewer", ROLE_USER).await;
    token_for(id, ROLE_USER)
}

pub async fn create_group(pool: &PgPool, name: &str) -> i64 {
    let (id,): (i64,) = sqlx::query_as("INSERT INTO groups (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .expect("group insert should succeed");
    id
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
