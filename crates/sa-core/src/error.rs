//! Core error types for School Admin RS

use std::collections::HashMap;
use thiserror::Error;

/// Core error type for record-level operations
#[derive(Error, Debug)]
pub enum SaError {
    #[error("Not found: {entity} with id={id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type SaResult<T> = Result<T, SaError>;

impl SaError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        SaError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        SaError::Conflict {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        SaError::Forbidden {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            SaError::NotFound { .. } => 404,
            SaError::Forbidden { .. } => 403,
            SaError::Validation(_) => 422,
            SaError::Conflict { .. } => 409,
            SaError::Config(_) | SaError::Internal(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            SaError::NotFound { .. } => "not_found",
            SaError::Forbidden { .. } => "forbidden",
            SaError::Validation(_) => "validation_failed",
            SaError::Conflict { .. } => "conflict",
            SaError::Config(_) => "configuration_error",
            SaError::Internal(_) => "internal_error",
        }
    }
}

/// Validation errors collection
#[derive(Error, Debug, Default, Clone)]
#[error("Validation errors: {errors:?}")]
pub struct ValidationErrors {
    /// Field-specific errors: field_name -> Vec<error_messages>
    pub errors: HashMap<String, Vec<String>>,
    /// Base errors not tied to a specific field
    pub base_errors: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_base(&mut self, message: impl Into<String>) {
        self.base_errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.base_errors.is_empty()
    }

    /// Check if there are errors for a specific field
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
        self.base_errors.extend(other.base_errors);
    }

    /// Messages sorted by field so responses are stable
    pub fn full_messages(&self) -> Vec<String> {
        let mut messages = self.base_errors.clone();
        let mut fields: Vec<_> = self.errors.iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        for (field, field_messages) in fields {
            for msg in field_messages {
                messages.push(format!("{} {}", field, msg));
            }
        }
        messages
    }

    /// Convert into a `Result`, failing when any error was collected
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<validator::ValidationErrors> for ValidationErrors {
    fn from(source: validator::ValidationErrors) -> Self {
        let mut errors = ValidationErrors::new();
        for (field, field_errors) in source.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("is invalid ({})", error.code));
                errors.add(field, message);
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(email)]
        email: String,
        #[validate(length(min = 1, message = "can't be blank"))]
        name: String,
    }

    #[test]
    fn test_full_messages_are_sorted() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "is taken");
        errors.add("admission_no", "is taken");
        errors.add_base("record is locked");

        assert_eq!(
            errors.full_messages(),
            vec![
                "record is locked".to_string(),
                "admission_no is taken".to_string(),
                "email is taken".to_string(),
            ]
        );
    }

    #[test]
    fn test_from_validator_errors() {
        let sample = Sample {
            email: "not-an-email".into(),
            name: String::new(),
        };
        let errors: ValidationErrors = sample.validate().unwrap_err().into();

        assert!(errors.has_error("email"));
        assert_eq!(errors.get("name").unwrap(), &vec!["can't be blank".to_string()]);
    }

    #[test]
    fn test_into_result() {
        assert!(ValidationErrors::new().into_result().is_ok());

        let mut errors = ValidationErrors::new();
        errors.add("email", "is invalid");
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(SaError::not_found("Staff", "1").status_code(), 404);
        assert_eq!(SaError::conflict("dup").status_code(), 409);
        assert_eq!(
            SaError::Validation(ValidationErrors::new()).error_code(),
            "validation_failed"
        );
    }
}
