//! Shared identifiers and the per-request context passed through the pipeline.

mod context;
mod types;

pub use context::RequestContext;
pub use types::{CorrelationId, EntityId, TransactionId};

pub use tokio_util::sync::CancellationToken;
