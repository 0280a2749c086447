/// Error types for the directory service
///
/// Service and repository errors map onto HTTP responses with a uniform
/// JSON body: `{"error": "...", "code": "...", "status": 404}`.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use doc_store::DocStoreError;
use thiserror::Error;

/// Result type for directory-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Store(DocStoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Store(_) => "STORAGE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show a client. Storage and internal details are
    /// logged instead.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Store(e) => {
                tracing::error!("Storage error: {:?}", e);
                "Storage error occurred".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<DocStoreError> for AppError {
    fn from(err: DocStoreError) -> Self {
        match err {
            DocStoreError::NotFound { collection, id } => {
                AppError::NotFound(format!("{} {}", collection, id))
            }
            DocStoreError::AlreadyExists { collection, id } => {
                AppError::Conflict(format!("{} {} already exists", collection, id))
            }
            DocStoreError::InvalidCursor(msg) => AppError::BadRequest(format!("invalid cursor: {}", msg)),
            DocStoreError::InvalidField(field) => {
                AppError::BadRequest(format!("invalid field: {}", field))
            }
            other => AppError::Store(other),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = self.public_message();

        HttpResponse::build(status).json(serde_json::json!({
            "error": message,
            "code": self.code(),
            "status": status.as_u16(),
        }))
    }
}
