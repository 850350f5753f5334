//! A handler composed with its ordered behaviors.

use std::sync::Arc;

use common::RequestContext;
use domain::DomainError;

use crate::behavior::{Behavior, Next};
use crate::request::{Request, RequestHandler};

/// The behavior chain for one request type, composed once and reused per call.
///
/// Behaviors run in the order they were added; the first added is outermost.
pub struct Pipeline<R: Request> {
    handler: Arc<dyn RequestHandler<R>>,
    behaviors: Vec<Arc<dyn Behavior<R>>>,
}

impl<R: Request> Pipeline<R> {
    /// Creates a pipeline that calls `handler` directly.
    pub fn new(handler: Arc<dyn RequestHandler<R>>) -> Self {
        Self {
            handler,
            behaviors: Vec::new(),
        }
    }

    /// Appends a behavior inside the ones already added.
    pub fn with_behavior(mut self, behavior: Arc<dyn Behavior<R>>) -> Self {
        self.behaviors.push(behavior);
        self
    }

    /// Runs the request through every behavior and then the handler.
    pub async fn send(&self, ctx: &RequestContext, request: R) -> Result<R::Response, DomainError> {
        Next::new(self.handler.as_ref(), &self.behaviors)
            .run(ctx, request)
            .await
    }
}
