use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::AuditError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Feature disabled: {0}")]
    FeatureDisabled(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Well-formed request the audit trail cannot act on.
    #[error("Unprocessable ({code}): {message}")]
    Unprocessable { code: &'static str, message: String },

    /// A storage or network collaborator failed.
    #[error("Upstream failure ({code}): {message}")]
    Upstream { code: &'static str, message: String },
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

#[derive(Debug, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, "unauthenticated", msg),
            ApiError::FeatureDisabled(msg) => (StatusCode::FORBIDDEN, "feature_disabled", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg),
            ApiError::Unprocessable { code, message } => {
                (StatusCode::UNPROCESSABLE_ENTITY, code, message)
            }
            ApiError::Upstream { code, message } => {
                tracing::error!(error_code = code, "Upstream failure: {}", message);
                (StatusCode::BAD_GATEWAY, code, message)
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        let code = err.code();
        let message = err.to_string();
        match err {
            AuditError::Unauthenticated => ApiError::Unauthenticated(message),
            AuditError::FeatureDisabled => ApiError::FeatureDisabled(message),
            AuditError::NotFound => ApiError::NotFound(message),
            AuditError::Conflict(_) => ApiError::Conflict(message),
            AuditError::UnsupportedAction(_)
            | AuditError::UnsupportedTargetType(_)
            | AuditError::MissingSnapshot
            | AuditError::MissingTargetId
            | AuditError::InvalidEntry(_) => ApiError::Unprocessable { code, message },
            AuditError::StorageFailure(_) | AuditError::NetworkFailure(_) => {
                ApiError::Upstream { code, message }
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<ValidationDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| ValidationDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("invalid {}", field)),
                })
            })
            .collect();

        let message = if details.len() == 1 {
            details[0].message.clone()
        } else {
            format!("{} validation errors", details.len())
        };

        ApiError::Validation(message)
    }
}
