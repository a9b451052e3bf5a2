use api_ingress::AppError;

use crate::domain::error::DomainError;

/// Map domain error to the HTTP boundary error.
pub fn map_domain_error(e: DomainError) -> AppError {
    match e {
        DomainError::Validation { .. } | DomainError::EmailAlreadyInUse { .. } => {
            AppError::BadRequest(e.to_string())
        }
        // Storage messages are already prefixed with what failed.
        DomainError::Database { message } => AppError::Server(message),
    }
}
