//! HTTP error mapping for configuration, history, and portable handlers.
//!
//! Every error leaves the API as `{ "error": <message>, "code": <CODE> }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use concierge_core::error::CoreError;
use serde_json::json;

/// PostgreSQL SQLSTATE for a unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL SQLSTATE for a foreign key violation.
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Malformed input that never reached the domain layer, such as an
    /// import document that is not JSON.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

type ErrorParts = (StatusCode, &'static str, String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        (status, axum::Json(json!({ "error": message, "code": code }))).into_response()
    }
}

fn internal() -> ErrorParts {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

fn classify_core_error(err: &CoreError) -> ErrorParts {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

/// Map a sqlx error to a response.
///
/// Constraint violations are named after what they mean for a configuration:
///
/// | SQLSTATE | Constraint | Response |
/// |---|---|---|
/// | 23505 | `uq_extensions_configuration_external_id` | 409, extension listed twice |
/// | 23505 | `uq_configuration_history_configuration_version` | 409, concurrent version |
/// | 23505 | any other `uq_*` | 409 |
/// | 23503 | `configuration_groups_group_id_fkey` | 400, group removed meanwhile |
/// | 23503 | any other | 409 |
///
/// `RowNotFound` is a 404 and everything else a sanitized 500.
fn classify_sqlx_error(err: &sqlx::Error) -> ErrorParts {
    let db_err = match err {
        sqlx::Error::RowNotFound => {
            return (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Resource not found".to_string(),
            )
        }
        sqlx::Error::Database(db_err) => db_err,
        other => {
            tracing::error!(error = %other, "Database error");
            return internal();
        }
    };

    let constraint = db_err.constraint().unwrap_or_default();
    match db_err.code().as_deref() {
        Some(UNIQUE_VIOLATION) if constraint.starts_with("uq_") => {
            let message = match constraint {
                "uq_extensions_configuration_external_id" => {
                    "An extension with this id is already attached to the configuration"
                        .to_string()
                }
                "uq_configuration_history_configuration_version" => {
                    "Another change recorded this history version first; retry the request"
                        .to_string()
                }
                other => format!("Duplicate value violates unique constraint: {other}"),
            };
            (StatusCode::CONFLICT, "CONFLICT", message)
        }
        Some(FOREIGN_KEY_VIOLATION) if constraint == "configuration_groups_group_id_fkey" => (
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "A group assigned to the configuration was deleted while saving".to_string(),
        ),
        Some(FOREIGN_KEY_VIOLATION) => {
            tracing::warn!(constraint, "Referenced row disappeared during write");
            (
                StatusCode::CONFLICT,
                "CONFLICT",
                "A referenced record no longer exists".to_string(),
            )
        }
        _ => {
            tracing::error!(error = %db_err, "Database error");
            internal()
        }
    }
}
