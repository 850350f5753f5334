//! Domain error types.

use std::convert::Infallible;

use thiserror::Error;

/// Errors that can occur while handling a request against the domain.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A caller-supplied value was rejected by the aggregate.
    #[error("Invalid argument `{param}`: {message}")]
    InvalidArgument {
        param: &'static str,
        message: String,
    },

    /// The unit of work was driven in an order it does not allow.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A storage failure that may succeed if the whole unit of work is retried.
    #[error("Transient storage failure: {0}")]
    Transient(String),

    /// A storage failure that retrying will not fix.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The request's cancellation token fired.
    #[error("Request was cancelled")]
    Cancelled,
}

impl DomainError {
    /// Builds an `InvalidArgument` error.
    pub fn invalid_argument(param: &'static str, message: impl Into<String>) -> Self {
        DomainError::InvalidArgument {
            param,
            message: message.into(),
        }
    }

    /// Returns true if the execution strategy may retry after this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::Transient(_))
    }
}

impl From<Infallible> for DomainError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(DomainError::Transient("connection reset".into()).is_transient());
        assert!(!DomainError::Storage("constraint violated".into()).is_transient());
        assert!(!DomainError::invalid_argument("status", "bad").is_transient());
        assert!(!DomainError::InvalidOperation("stale".into()).is_transient());
        assert!(!DomainError::Cancelled.is_transient());
    }

    #[test]
    fn invalid_argument_names_the_parameter() {
        let err = DomainError::invalid_argument("modified_by", "cannot be blank");
        assert_eq!(
            err.to_string(),
            "Invalid argument `modified_by`: cannot be blank"
        );
    }
}
