use crate::validation::ValidationErrors;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    #[error("user with id {0} not found")]
    UserNotFound(i32),

    #[error("Email address is already in use")]
    EmailAlreadyExists(String),

    #[error("Invalid date range")]
    InvalidDateRange { from: NaiveDate, to: NaiveDate },

    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        DomainError::Validation(errors)
    }
}
