use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::{DbErr, SqlErr};
use uuid::Uuid;

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    Validation,
    Conflict,
    Internal,
}

/// Failure of an engagement operation.
///
/// Side-effect failures never appear here: they are absorbed by the dispatcher
/// (see [`crate::effects::DispatchError`]).
#[derive(Debug, thiserror::Error)]
pub enum EngagementError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(DbErr),
}

impl EngagementError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict(reason.into())
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized(reason.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngagementError::NotFound { .. } => ErrorKind::NotFound,
            EngagementError::Unauthorized(_) => ErrorKind::Unauthorized,
            EngagementError::Validation(_) => ErrorKind::Validation,
            EngagementError::Conflict(_) => ErrorKind::Conflict,
            EngagementError::Database(_) => ErrorKind::Internal,
        }
    }
}

impl From<DbErr> for EngagementError {
    fn from(err: DbErr) -> Self {
        // A unique index caught a concurrent writer that slipped past the checks.
        if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            return EngagementError::Conflict(format!("duplicate record: {detail}"));
        }
        EngagementError::Database(err)
    }
}

impl ResponseError for EngagementError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
            ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string(),
        }))
    }
}

pub type EngagementResult<T> = Result<T, EngagementError>;
