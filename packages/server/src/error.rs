use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use classifier::ClassifyError;
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::models::outcome::{FlashLevel, Outcome};

/// Structured error response returned by JSON endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`,
    /// `NOT_AUTHENTICATED`, `NOT_FOUND`, `PAYLOAD_TOO_LARGE`,
    /// `CLASSIFIER_UNAVAILABLE`, `INTERNAL_ERROR`.
    #[schema(example = "NOT_FOUND")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Image not found")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    /// JSON endpoints reached without a session.
    NotAuthenticated,
    /// Page flows reached without a session; answered with a redirect to `/login`.
    LoginRequired(&'static str),
    NotFound(String),
    PayloadTooLarge(String),
    ClassifierUnavailable,
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::NotAuthenticated | AppError::LoginRequired(_) => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "NOT_AUTHENTICATED",
                    message: "Authentication required".into(),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorBody {
                    code: "PAYLOAD_TOO_LARGE",
                    message: msg,
                },
            ),
            AppError::ClassifierUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody {
                    code: "CLASSIFIER_UNAVAILABLE",
                    message: "Image classification is not enabled".into(),
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::LoginRequired(message) = self {
            return Outcome::failure(FlashLevel::Warning, message, "/login").into_response();
        }

        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(name) => AppError::NotFound(format!("File '{name}' not found")),
            StorageError::InvalidName(_) => AppError::NotFound("File not found".into()),
            StorageError::Io(e) => AppError::Internal(format!("Storage IO error: {e}")),
        }
    }
}

impl From<ClassifyError> for AppError {
    fn from(err: ClassifyError) -> Self {
        match err {
            ClassifyError::ImageNotFound(_) => {
                tracing::warn!("Classification target missing: {err}");
                AppError::NotFound("Image file not found".into())
            }
            ClassifyError::Decode(_) | ClassifyError::EmptyImage => {
                AppError::Validation(format!("File is not a supported image: {err}"))
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}
