//! Service errors

use sa_attachments::AttachmentError;
use sa_core::{SaError, ValidationErrors};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] SaError),
    #[error(transparent)]
    Attachment(#[from] AttachmentError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        ServiceError::Core(SaError::Validation(errors))
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ValidationErrors::from(errors).into()
    }
}
