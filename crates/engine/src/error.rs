use adpace_core::error::CoreError;

/// SQLSTATE codes that indicate contention rather than a bad request:
/// serialization failure, deadlock, lock not available, query cancelled.
const TRANSIENT_SQLSTATES: [&str; 4] = ["40001", "40P01", "55P03", "57014"];

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        EngineError::Core(CoreError::NotFound { entity, id })
    }

    /// Whether the failed unit of work may succeed if simply retried.
    pub fn is_transient(&self) -> bool {
        match self {
            EngineError::Core(e) => e.is_transient(),
            EngineError::Database(e) => is_transient_sqlx(e),
        }
    }

    /// Bad input or unknown entity: report to the caller, never retry.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            EngineError::Core(CoreError::Validation(_) | CoreError::NotFound { .. })
        )
    }
}

/// Classify a `sqlx::Error` as transient.
pub fn is_transient_sqlx(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => true,
        sqlx::Error::Database(db) => db
            .code()
            .is_some_and(|code| TRANSIENT_SQLSTATES.contains(&code.as_ref())),
        _ => false,
    }
}
