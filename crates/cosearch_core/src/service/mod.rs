//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate validation, link reconciliation and repository calls into
//!   use-case level APIs per catalog entity.
//! - Keep the HTTP layer decoupled from storage details.
//!
//! # Invariants
//! - Every write runs inside one `IMMEDIATE` transaction; any error before
//!   commit drops the transaction and rolls everything back.
//! - Unresolved references surface as `ServiceError::NotFound`.
//! - Uniqueness violations surface as `ServiceError::Condition`.

use crate::model::ValidationError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod contribution_service;
pub mod contributor_service;
pub mod integrity;
pub mod review_service;
pub mod tag_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error taxonomy shared by all catalog services.
#[derive(Debug)]
pub enum ServiceError {
    /// Referenced entity does not exist, e.g. `Tag ID 4`.
    NotFound(String),
    /// A business condition failed, e.g. a uniqueness rule.
    Condition(String),
    /// Payload failed field validation.
    InvalidInput(String),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl ServiceError {
    pub fn condition(message: impl Into<String>) -> Self {
        Self::Condition(message.into())
    }

    /// `NotFound` for a path-addressed entity, e.g. `Contribution`.
    pub fn missing(what: &str) -> Self {
        Self::NotFound(what.to_string())
    }

}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(what) => write!(f, "{what} cannot be found."),
            Self::Condition(condition) => write!(f, "{condition}"),
            Self::InvalidInput(message) => write!(f, "{message}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent catalog state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(what) => Self::NotFound(what),
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::InvalidInput(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::ServiceError;
    use crate::model::ValidationError;
    use crate::repo::RepoError;

    #[test]
    fn repo_not_found_becomes_service_not_found() {
        let err = ServiceError::from(RepoError::not_found("Contributor", 3));
        assert!(matches!(err, ServiceError::NotFound(ref what) if what == "Contributor ID 3"));
        assert_eq!(err.to_string(), "Contributor ID 3 cannot be found.");
    }

    #[test]
    fn other_repo_errors_stay_internal() {
        let err = ServiceError::from(RepoError::InvalidData("bad links".to_string()));
        assert!(matches!(err, ServiceError::Repo(_)));
    }

    #[test]
    fn validation_errors_are_invalid_input() {
        let err = ServiceError::from(ValidationError::EmptyField("title"));
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
