use adpace_core::error::CoreError;
use adpace_engine::EngineError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Error type returned by every handler.
///
/// Serialized as `{ "success": false, "error": <message>, "code": <CODE> }`.
/// Messages for internal failures are replaced by a generic one; the detail
/// goes to the log.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Malformed request that never reached domain validation.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Core(e) => AppError::Core(e),
            EngineError::Database(e) => AppError::Database(e),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    code: &'static str,
}

/// Status, machine-readable code and caller-facing message.
struct Mapped(StatusCode, &'static str, String);

impl Mapped {
    fn internal() -> Self {
        Mapped(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "An internal error occurred".to_string(),
        )
    }

    fn unavailable() -> Self {
        Mapped(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Temporarily unavailable, retry later".to_string(),
        )
    }
}

impl AppError {
    fn mapped(&self) -> Mapped {
        match self {
            AppError::Core(CoreError::NotFound { entity, .. }) => {
                Mapped(StatusCode::NOT_FOUND, "NOT_FOUND", format!("{entity} not found"))
            }
            AppError::Core(CoreError::Validation(msg)) => {
                Mapped(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Core(CoreError::Conflict(msg)) => {
                Mapped(StatusCode::CONFLICT, "CONFLICT", msg.clone())
            }
            AppError::Core(CoreError::Transient(msg)) => {
                tracing::warn!(error = %msg, "Transient failure");
                Mapped::unavailable()
            }
            AppError::Core(CoreError::Internal(msg)) | AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                Mapped::internal()
            }
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::BadRequest(msg) => Mapped(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let Mapped(status, code, error) = self.mapped();
        let body = ErrorBody {
            success: false,
            error,
            code,
        };
        (status, Json(body)).into_response()
    }
}

/// Lock contention and pool exhaustion are worth retrying (503). A missing
/// row is a 404 and a `uq_*` unique violation a 409. Anything else is a
/// sanitized 500.
fn classify_sqlx_error(err: &sqlx::Error) -> Mapped {
    if adpace_engine::error::is_transient_sqlx(err) {
        tracing::warn!(error = %err, "Transient database error");
        return Mapped::unavailable();
    }

    match err {
        sqlx::Error::RowNotFound => {
            Mapped(StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found".to_string())
        }
        sqlx::Error::Database(db_err)
            if db_err.code().as_deref() == Some("23505")
                && db_err.constraint().is_some_and(|c| c.starts_with("uq_")) =>
        {
            let constraint = db_err.constraint().unwrap_or_default();
            Mapped(
                StatusCode::CONFLICT,
                "CONFLICT",
                format!("Duplicate value violates unique constraint: {constraint}"),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            Mapped::internal()
        }
    }
}
