// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::manager::DatabaseError;
use crate::services::points_service::PointsError;
use crate::services::storage_service::StorageError;

/// HTTP API error with appropriate status codes and client-friendly messages.
/// The wire shape is the flat `{"error": "..."}` envelope the admin frontend
/// expects; user-facing domain messages stay in Russian.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 413 Payload Too Large
    PayloadTooLarge(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({ "error": self.message() })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        ApiError::PayloadTooLarge(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConfigMissing(_) => {
                tracing::error!("Database configuration error: {}", err);
                ApiError::service_unavailable("База данных недоступна")
            }
            DatabaseError::Sqlx(e) => {
                // Log the real error but return a generic message
                tracing::error!("SQLx error: {}", e);
                ApiError::internal_server_error("Ошибка базы данных")
            }
            DatabaseError::Migration(e) => {
                tracing::error!("Migration error: {}", e);
                ApiError::service_unavailable("Сервис обновляется, повторите попытку позже")
            }
        }
    }
}

impl From<PointsError> for ApiError {
    fn from(err: PointsError) -> Self {
        match err {
            PointsError::InsufficientBalance => ApiError::bad_request("Недостаточно баллов"),
            PointsError::Database(e) => e.into(),
            PointsError::Sqlx(e) => {
                tracing::error!("Points ledger query error: {}", e);
                ApiError::internal_server_error("Ошибка базы данных")
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::FolderNotFound => ApiError::not_found("Папка не найдена"),
            StorageError::DuplicateFolder => {
                ApiError::conflict("Папка с таким именем уже существует")
            }
            StorageError::FileTooLarge(_) => {
                ApiError::payload_too_large("Файл превышает допустимый размер")
            }
            StorageError::Database(e) => e.into(),
            StorageError::Sqlx(e) => {
                tracing::error!("Storage query error: {}", e);
                ApiError::internal_server_error("Ошибка базы данных")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_balance_maps_to_400_with_domain_message() {
        let err: ApiError = PointsError::InsufficientBalance.into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_json(), json!({ "error": "Недостаточно баллов" }));
    }

    #[test]
    fn storage_errors_map_to_expected_statuses() {
        let not_found: ApiError = StorageError::FolderNotFound.into();
        assert_eq!(not_found.status_code(), 404);

        let conflict: ApiError = StorageError::DuplicateFolder.into();
        assert_eq!(conflict.status_code(), 409);

        let too_large: ApiError = StorageError::FileTooLarge(100 * 1024 * 1024).into();
        assert_eq!(too_large.status_code(), 413);
    }
}
