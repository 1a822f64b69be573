//! Errors produced by the service layer

use crate::core::validation::camel_case;
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Flattens the field errors of a `#[derive(Validate)]` check, prefixing each field name.
    ///
    /// Output is sorted by field so responses are stable.
    pub fn from_validation(errors: &ValidationErrors, prefix: &str) -> Vec<FieldError> {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                let field = format!("{prefix}{}", camel_case(&field));
                errors.iter().map(move |error| {
                    let message = match &error.message {
                        Some(message) => message.to_string(),
                        None => format!("is invalid ({})", error.code),
                    };
                    FieldError::new(field.clone(), message)
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        fields
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// The entity does not exist, or it exists but the caller may not see it.
    ///
    /// Both causes map to the same error so callers cannot probe for existence.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error(transparent)]
    Store(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::Validation(vec![FieldError::new(field, message)])
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        ServiceError::Validation(FieldError::from_validation(&errors, ""))
    }
}

/// True if the store rejected a write because of a UNIQUE constraint.
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|db_error| db_error.is_unique_violation())
}
