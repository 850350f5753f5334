//! Request and handler contracts.

use async_trait::async_trait;
use common::RequestContext;
use domain::DomainError;

/// A request sent through the pipeline.
///
/// Each request type has exactly one handler and a fixed response type.
/// Requests are cloned when a unit of work is retried, so they should be cheap
/// to clone.
pub trait Request: Clone + std::fmt::Debug + Send + Sync + 'static {
    /// The response produced by the request's handler.
    type Response: Send + 'static;

    /// Name used in logs and metric labels.
    const NAME: &'static str;
}

/// Handles one request type.
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync {
    async fn handle(&self, ctx: &RequestContext, request: R) -> Result<R::Response, DomainError>;
}
