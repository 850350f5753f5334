use std::time::Instant;

use async_trait::async_trait;
use common::RequestContext;
use domain::DomainError;

use super::{Behavior, Next};
use crate::request::Request;

/// Records entry and exit of every request it wraps.
///
/// Never alters the response; failures are logged and returned unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingBehavior;

#[async_trait]
impl<R: Request> Behavior<R> for LoggingBehavior {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: R,
        next: Next<'_, R>,
    ) -> Result<R::Response, DomainError> {
        tracing::info!(
            request = R::NAME,
            correlation_id = %ctx.correlation_id(),
            "Handling {} ({:?})",
            R::NAME,
            request
        );
        metrics::counter!("pipeline_requests_total", "request" => R::NAME).increment(1);
        let started = Instant::now();

        let result = next.run(ctx, request).await;

        metrics::histogram!("pipeline_request_duration_seconds", "request" => R::NAME)
            .record(started.elapsed().as_secs_f64());
        match &result {
            Ok(_) => tracing::info!(request = R::NAME, "Handled {}", R::NAME),
            Err(err) => {
                metrics::counter!("pipeline_request_failures_total", "request" => R::NAME)
                    .increment(1);
                tracing::error!(request = R::NAME, error = %err, "Failed handling {}", R::NAME);
            }
        }
        result
    }
}
