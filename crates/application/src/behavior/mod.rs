//! Pipeline behaviors and the continuation they call into.

mod logging;
mod transaction;

use std::sync::Arc;

use async_trait::async_trait;
use common::RequestContext;
use domain::DomainError;
use futures_util::future::BoxFuture;

use crate::request::{Request, RequestHandler};

pub use logging::LoggingBehavior;
pub use transaction::TransactionBehavior;

/// Middleware wrapped around a request handler.
///
/// A behavior runs its own logic around `next`. It may call `next` more than
/// once (the transaction behavior does when retrying) and must return
/// whatever error the rest of the chain produced.
#[async_trait]
pub trait Behavior<R: Request>: Send + Sync {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: R,
        next: Next<'_, R>,
    ) -> Result<R::Response, DomainError>;
}

/// The remainder of a behavior chain, ending in the handler.
pub struct Next<'a, R: Request> {
    handler: &'a dyn RequestHandler<R>,
    rest: &'a [Arc<dyn Behavior<R>>],
}

impl<R: Request> Clone for Next<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: Request> Copy for Next<'_, R> {}

impl<'a, R: Request> Next<'a, R> {
    pub(crate) fn new(handler: &'a dyn RequestHandler<R>, rest: &'a [Arc<dyn Behavior<R>>]) -> Self {
        Self { handler, rest }
    }

    /// Runs the next behavior, or the handler once no behaviors remain.
    pub fn run<'b>(
        self,
        ctx: &'b RequestContext,
        request: R,
    ) -> BoxFuture<'b, Result<R::Response, DomainError>>
    where
        'a: 'b,
    {
        match self.rest.split_first() {
            Some((behavior, rest)) => behavior.handle(ctx, request, Next::new(self.handler, rest)),
            None => self.handler.handle(ctx, request),
        }
    }
}
