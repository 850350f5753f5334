//! Unit-of-work contract.

use async_trait::async_trait;
use common::{RequestContext, TransactionId};

use crate::error::DomainError;
use crate::execution::ExecutionStrategy;

/// Handle to the physical transaction a unit of work currently holds.
///
/// Handles compare by transaction id; committing with a handle that does not
/// match the active one is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionHandle {
    id: TransactionId,
}

impl TransactionHandle {
    pub fn new() -> Self {
        Self {
            id: TransactionId::new(),
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }
}

impl Default for TransactionHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// The scope of one logical transaction.
///
/// A unit of work holds at most one active transaction. Repository operations
/// issued through the same unit of work are staged against that transaction and
/// only become durable on commit.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Returns true if a transaction handle is currently held.
    fn has_active_transaction(&self) -> bool;

    /// Returns the active transaction handle, if any.
    fn current_transaction(&self) -> Option<TransactionHandle>;

    /// Returns the retry strategy the store wants begin/run/commit wrapped in.
    fn execution_strategy(&self) -> ExecutionStrategy;

    /// Opens a read-committed transaction.
    ///
    /// Returns `Ok(None)` without beginning anything if a transaction is already
    /// active.
    async fn begin_transaction(
        &self,
        ctx: &RequestContext,
    ) -> Result<Option<TransactionHandle>, DomainError>;

    /// Persists all staged changes and commits.
    ///
    /// Fails with `InvalidOperation` if `transaction` is not the active handle.
    /// On a failure while persisting, the transaction is rolled back and the
    /// error returned. The handle is released in every case.
    async fn commit_transaction(&self, transaction: &TransactionHandle)
    -> Result<(), DomainError>;

    /// Rolls back the active transaction, if any, and discards staged changes.
    ///
    /// The handle is released even if the rollback itself fails.
    async fn rollback_transaction(&self);
}
