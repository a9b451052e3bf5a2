use thiserror::Error;

use crate::domain::repo::RepoError;

/// Domain-specific errors using thiserror
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid request: {message}.")]
    Validation { message: String },

    #[error("Email is already being used by another student.")]
    EmailAlreadyInUse { email: String },

    #[error("{message}")]
    Database { message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn email_already_in_use(email: impl Into<String>) -> Self {
        Self::EmailAlreadyInUse {
            email: email.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}

impl From<RepoError> for DomainError {
    fn from(e: RepoError) -> Self {
        match e {
            // A query the repository cannot translate is a caller mistake.
            RepoError::InvalidQuery(m) => DomainError::validation(m),
            RepoError::Conflict(m) | RepoError::Storage(m) => DomainError::database(m),
        }
    }
}
