//! HTTP error responses

use crate::core::errors::{FieldError, ServiceError};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthorized,

    #[error("insufficient permissions")]
    Forbidden,

    #[error("{0}")]
    BadRequest(String),

    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// Absent or not visible to the caller.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("internal server error")]
    Internal,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<FieldError>>,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(self) -> ErrorBody {
        let message = self.to_string();
        match self {
            ApiError::Unauthorized => ErrorBody {
                error: "Unauthorized",
                message: Some(message),
                details: None,
            },
            ApiError::Forbidden => ErrorBody {
                error: "Forbidden",
                message: Some(message),
                details: None,
            },
            ApiError::BadRequest(_) => ErrorBody {
                error: "Bad request",
                message: Some(message),
                details: None,
            },
            ApiError::Validation(details) => ErrorBody {
                error: "Validation failed",
                message: None,
                details: Some(details),
            },
            ApiError::NotFound(_) => ErrorBody {
                error: "Not found",
                message: Some(message),
                details: None,
            },
            ApiError::Conflict(_) => ErrorBody {
                error: "Conflict",
                message: Some(message),
                details: None,
            },
            ApiError::Internal => ErrorBody {
                error: "Internal server error",
                message: None,
                details: None,
            },
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(details) => ApiError::Validation(details),
            ServiceError::NotFound(what) => ApiError::NotFound(what),
            ServiceError::Conflict(message) => ApiError::Conflict(message),
            ServiceError::InvalidSignature => ApiError::Unauthorized,
            ServiceError::Store(e) => {
                error!("store failure: {e}");
                ApiError::Internal
            }
            ServiceError::Internal(e) => {
                error!("internal failure: {e:#}");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}
