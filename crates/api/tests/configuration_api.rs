//! HTTP-level integration tests for configuration and extension endpoints.
//!
//! Every mutation must leave a history entry attributed to the caller.

mod common;

use axum::http::StatusCode;
use common::{
    admin_token, body_json, create_group, delete_auth, get, get_auth, post_auth, post_json_auth,
    put_json_auth, user_token,
};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn create_configuration(pool: &PgPool, token: &str, body: serde_json::Value) -> i64 {
    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(app, "/api/v1/configurations", body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn history_versions(pool: &PgPool, token: &str, id: i64) -> Vec<serde_json::Value> {
    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, &format!("/api/v1/configurations/{id}/history"), token).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].as_array().unwrap().clone()
}

// ---------------------------------------------------------------------------
// Access control
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_requires_token(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/configurations").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_requires_admin_role(pool: PgPool) {
    let token = user_token(&pool).await;
    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/configurations", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Configuration CRUD
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_records_first_version(pool: PgPool) {
    let (admin_id, token) = admin_token(&pool).await;
    let group = create_group(&pool, "support").await;

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/configurations",
        json!({
            "name": "Support Bot",
            "chat_suggestions": ["Reset my password"],
            "group_ids": [group]
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Support Bot");
    assert_eq!(json["data"]["status"], "enabled");
    assert_eq!(json["data"]["group_ids"], json!([group]));

    let id = json["data"]["id"].as_i64().unwrap();
    let history = history_versions(&pool, &token, id).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["version"], 1);
    assert_eq!(history[0]["action"], "create");
    assert_eq!(history[0]["changed_by"], admin_id);
    assert_eq!(history[0]["snapshot"]["name"], "Support Bot");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_rejects_unknown_group(pool: PgPool) {
    let (_, token) = admin_token(&pool).await;
    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        "/api/v1/configurations",
        json!({ "name": "Bot", "group_ids": [404] }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "Unknown group ids: 404");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_reports_group_deleted_during_save(pool: PgPool) {
    let (_, token) = admin_token(&pool).await;
    let group = create_group(&pool, "support").await;

    // The group passes the existence check, then vanishes before its
    // association row is written.
    sqlx::query(
        "CREATE FUNCTION drop_group_on_assign() RETURNS trigger AS $$ \
         BEGIN DELETE FROM groups WHERE id = NEW.group_id; RETURN NEW; END; \
         $$ LANGUAGE plpgsql",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "CREATE TRIGGER trg_drop_group_on_assign BEFORE INSERT ON configuration_groups \
         FOR EACH ROW EXECUTE FUNCTION drop_group_on_assign()",
    )
    .execute(&pool)
    .await
    .unwrap();

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/configurations",
        json!({ "name": "Bot", "group_ids": [group] }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(
        json["error"],
        "A group assigned to the configuration was deleted while saving"
    );

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM configurations")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_rejects_blank_name(pool: PgPool) {
    let (_, token) = admin_token(&pool).await;
    let app = common::build_test_app(pool);
    let response =
        post_json_auth(app, "/api/v1/configurations", json!({ "name": "  " }), &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_appends_version(pool: PgPool) {
    let (_, token) = admin_token(&pool).await;
    let id = create_configuration(&pool, &token, json!({ "name": "Bot" })).await;

    let app = common::build_test_app(pool.clone());
    let response = put_json_auth(
        app,
        &format!("/api/v1/configurations/{id}"),
        json!({ "name": "Renamed", "status": "disabled" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Renamed");
    assert_eq!(json["data"]["status"], "disabled");

    let history = history_versions(&pool, &token, id).await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["version"], 2);
    assert_eq!(history[0]["action"], "update");
    assert_eq!(history[0]["snapshot"]["status"], "disabled");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_cannot_delete(pool: PgPool) {
    let (_, token) = admin_token(&pool).await;
    let id = create_configuration(&pool, &token, json!({ "name": "Bot" })).await;

    let app = common::build_test_app(pool);
    let response = put_json_auth(
        app,
        &format!("/api/v1/configurations/{id}"),
        json!({ "status": "deleted" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_soft_delete(pool: PgPool) {
    let (_, token) = admin_token(&pool).await;
    let id = create_configuration(&pool, &token, json!({ "name": "Bot" })).await;

    let app = common::build_test_app(pool.clone());
    let response = delete_auth(app, &format!("/api/v1/configurations/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Hidden from the default listing, visible on request.
    let app = common::build_test_app(pool.clone());
    let listed = body_json(get_auth(app, "/api/v1/configurations", &token).await).await;
    assert_eq!(listed["data"], json!([]));
    let app = common::build_test_app(pool.clone());
    let listed = body_json(
        get_auth(app, "/api/v1/configurations?include_deleted=true", &token).await,
    )
    .await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);

    // The row is kept and marked deleted.
    let app = common::build_test_app(pool.clone());
    let detail = body_json(get_auth(app, &format!("/api/v1/configurations/{id}"), &token).await)
        .await;
    assert_eq!(detail["data"]["status"], "deleted");

    let history = history_versions(&pool, &token, id).await;
    assert_eq!(history[0]["action"], "delete");

    // Deleted configurations cannot be updated or deleted again.
    let app = common::build_test_app(pool.clone());
    let response = put_json_auth(
        app,
        &format!("/api/v1/configurations/{id}"),
        json!({ "name": "Zombie" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let app = common::build_test_app(pool);
    let response = delete_auth(app, &format!("/api/v1/configurations/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_get_missing_configuration(pool: PgPool) {
    let (_, token) = admin_token(&pool).await;
    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/configurations/9999", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await["error"],
        "Configuration with id 9999 not found"
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_copies_disabled(pool: PgPool) {
    let (_, token) = admin_token(&pool).await;
    let id = create_configuration(&pool, &token, json!({ "name": "Bot" })).await;

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        &format!("/api/v1/configurations/{id}/extensions"),
        json!({ "name": "calculator" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let app = common::build_test_app(pool.clone());
    let response = post_auth(app, &format!("/api/v1/configurations/{id}/duplicate"), &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Bot (copy)");
    assert_eq!(json["data"]["status"], "disabled");
    assert_eq!(json["data"]["extensions"][0]["name"], "calculator");

    let copy_id = json["data"]["id"].as_i64().unwrap();
    assert_ne!(copy_id, id);
    let history = history_versions(&pool, &token, copy_id).await;
    assert_eq!(history.len(), 1);
    assert_eq!(
        history[0]["change_comment"],
        format!("Duplicated from configuration {id}")
    );
}

// ---------------------------------------------------------------------------
// Extensions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_add_extension_masks_secret_in_history(pool: PgPool) {
    let (_, token) = admin_token(&pool).await;
    let id = create_configuration(&pool, &token, json!({ "name": "Bot" })).await;

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        &format!("/api/v1/configurations/{id}/extensions"),
        json!({
            "name": "rag-tool",
            "values": { "endpoint": "https://rag.internal", "apiKey": "sk-live-123" }
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["external_id"], format!("{id}-rag-tool"));
    assert_eq!(json["data"]["values_json"]["apiKey"], "sk-live-123");

    let history = history_versions(&pool, &token, id).await;
    assert_eq!(history.len(), 2);
    let ext = &history[0]["snapshot"]["extensions"][0];
    assert_eq!(ext["values"]["endpoint"], "https://rag.internal");
    assert_eq!(ext["values"]["apiKey"], "********");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_add_extension_validates_values(pool: PgPool) {
    let (_, token) = admin_token(&pool).await;
    let id = create_configuration(&pool, &token, json!({ "name": "Bot" })).await;

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        &format!("/api/v1/configurations/{id}/extensions"),
        json!({ "name": "rag-tool", "values": { "endpoint": "https://rag.internal" } }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Extension 'rag-tool' is invalid: argument 'apiKey' is required"
    );

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        &format!("/api/v1/configurations/{id}/extensions"),
        json!({ "name": "teleporter" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Unknown extension type 'teleporter'"
    );

    // Rejected changes leave no history.
    assert_eq!(history_versions(&pool, &token, id).await.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_add_same_extension_twice_conflicts(pool: PgPool) {
    let (_, token) = admin_token(&pool).await;
    let id = create_configuration(&pool, &token, json!({ "name": "Bot" })).await;
    let uri = format!("/api/v1/configurations/{id}/extensions");

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(app, &uri, json!({ "name": "calculator" }), &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let app = common::build_test_app(pool);
    let response = post_json_auth(app, &uri, json!({ "name": "calculator" }), &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_and_remove_extension(pool: PgPool) {
    let (_, token) = admin_token(&pool).await;
    let id = create_configuration(&pool, &token, json!({ "name": "Bot" })).await;

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        &format!("/api/v1/configurations/{id}/extensions"),
        json!({ "name": "web-search", "values": { "maxResults": 5 } }),
        &token,
    )
    .await;
    let ext_id = body_json(response).await["data"]["id"].as_i64().unwrap();
    let uri = format!("/api/v1/configurations/{id}/extensions/{ext_id}");

    let app = common::build_test_app(pool.clone());
    let response = put_json_auth(app, &uri, json!({ "values": { "maxResults": 500 } }), &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = common::build_test_app(pool.clone());
    let response = put_json_auth(app, &uri, json!({ "enabled": false }), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["enabled"], false);

    let app = common::build_test_app(pool.clone());
    let response = delete_auth(app, &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let app = common::build_test_app(pool.clone());
    let response = delete_auth(app, &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // create, add, update, remove
    let history = history_versions(&pool, &token, id).await;
    assert_eq!(history.len(), 4);
    assert_eq!(history[0]["snapshot"]["extensions"], json!([]));
}
