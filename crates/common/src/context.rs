use tokio_util::sync::CancellationToken;

use crate::{CorrelationId, TransactionId};

/// Context carried explicitly through the behavior chain and into the unit of work.
///
/// Holds the correlation id of the inbound request, the id of the transaction the
/// request currently runs in (once one is opened) and a cooperative cancellation token.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    correlation_id: CorrelationId,
    transaction_id: Option<TransactionId>,
    cancellation: CancellationToken,
}

impl RequestContext {
    /// Creates a context with a fresh correlation id and a token that is never cancelled
    /// unless the caller cancels it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context for an existing correlation id.
    pub fn with_correlation_id(correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id,
            ..Self::default()
        }
    }

    /// Replaces the cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Returns a copy of this context bound to the given transaction.
    pub fn in_transaction(&self, transaction_id: TransactionId) -> Self {
        Self {
            transaction_id: Some(transaction_id),
            ..self.clone()
        }
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    pub fn transaction_id(&self) -> Option<TransactionId> {
        self.transaction_id
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
