//! API error handling
//!
//! Every failure leaves as `{"error": <code>, "message": <text>}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sa_attachments::{AttachmentError, UploadRejection};
use sa_core::{SaError, ValidationErrors};
use sa_services::ServiceError;
use serde::Serialize;
use tracing::error;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    NotFound { resource: &'static str, id: String },
    Validation(ValidationErrors),
    Forbidden(String),
    BadRequest(String),
    Conflict(String),
    PayloadTooLarge(String),
    Internal(String),
}

impl ApiError {
    pub fn not_found(resource: &'static str, id: impl std::fmt::Display) -> Self {
        ApiError::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound { .. } => "not_found",
            ApiError::Validation(_) => "validation_failed",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Conflict(_) => "conflict",
            ApiError::PayloadTooLarge(_) => "payload_too_large",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = self.error_code();
        let (message, details) = match self {
            ApiError::NotFound { resource, id } => {
                (format!("{} with id {} not found", resource, id), Vec::new())
            }
            ApiError::Validation(errors) => {
                let details = errors.full_messages();
                (details.join(", "), details)
            }
            ApiError::Forbidden(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::Internal(msg) => (msg, Vec::new()),
        };

        (
            status,
            Json(ErrorBody {
                error,
                message,
                details,
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<SaError> for ApiError {
    fn from(err: SaError) -> Self {
        match err {
            SaError::NotFound { entity, id } => ApiError::not_found(entity, id),
            SaError::Forbidden { message } => ApiError::Forbidden(message),
            SaError::Validation(errors) => ApiError::Validation(errors),
            SaError::Conflict { message } => ApiError::Conflict(message),
            SaError::Config(msg) | SaError::Internal(msg) => {
                error!(error = %msg, "Request failed");
                ApiError::internal("Internal server error")
            }
        }
    }
}

impl From<UploadRejection> for ApiError {
    fn from(rejection: UploadRejection) -> Self {
        match rejection {
            UploadRejection::FileTooLarge { .. } | UploadRejection::TooManyFiles { .. } => {
                ApiError::PayloadTooLarge(rejection.to_string())
            }
            _ => ApiError::BadRequest(rejection.to_string()),
        }
    }
}

impl From<AttachmentError> for ApiError {
    fn from(err: AttachmentError) -> Self {
        match err {
            AttachmentError::Rejected(rejection) => rejection.into(),
            err if err.is_client_error() => ApiError::BadRequest(err.to_string()),
            // storage failures stay in the logs; they may name server paths
            other => {
                error!(error = %other, "Attachment storage failed");
                ApiError::internal("Failed to store attachments")
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Core(e) => e.into(),
            ServiceError::Attachment(e) => e.into(),
        }
    }
}
