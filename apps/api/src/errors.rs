use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Upload-time document failures. These are the only user-visible errors in
/// the flow besides validation; everything downstream recovers via fallbacks.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Unsupported document format: {0}. Please upload a PDF or DOCX file")]
    UnsupportedFormat(String),

    #[error("Could not read file: {0}")]
    Unreadable(String),
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Document(DocumentError::UnsupportedFormat(_)) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_FORMAT",
                self.to_string(),
            ),
            AppError::Document(DocumentError::Unreadable(_)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNREADABLE_DOCUMENT",
                self.to_string(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_errors_map_to_client_statuses() {
        let unsupported: AppError = DocumentError::UnsupportedFormat("txt".to_string()).into();
        assert_eq!(
            unsupported.into_response().status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );

        let unreadable: AppError = DocumentError::Unreadable("bad zip".to_string()).into();
        assert_eq!(
            unreadable.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_conflict_maps_to_409() {
        let err = AppError::Conflict("interview already completed".to_string());
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }
}
