use common::EntityId;
use domain::DomainError;
use thiserror::Error;

/// Errors that can occur when interacting with a service request store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// A staged update or delete targeted a row that no longer exists.
    #[error("Service request {0} was removed by another unit of work")]
    Missing(EntityId),

    /// A stored row could not be mapped back onto the aggregate.
    #[error("Invalid row for service request {id}: {message}")]
    InvalidRow { id: EntityId, message: String },

    /// The store is temporarily unable to serve the unit of work.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl PersistenceError {
    /// Returns true if retrying the whole unit of work may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            PersistenceError::Unavailable(_) => true,
            PersistenceError::Database(err) => is_transient_sqlx(err),
            _ => false,
        }
    }
}

fn is_transient_sqlx(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => true,
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| {
            // serialization_failure, deadlock_detected, admin_shutdown, connection exceptions
            matches!(code.as_ref(), "40001" | "40P01" | "57P01") || code.starts_with("08")
        }),
        _ => false,
    }
}

impl From<PersistenceError> for DomainError {
    fn from(err: PersistenceError) -> Self {
        if err.is_transient() {
            DomainError::Transient(err.to_string())
        } else {
            DomainError::Storage(err.to_string())
        }
    }
}

/// Result type for persistence operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;
