use std::sync::Arc;

use async_trait::async_trait;
use common::RequestContext;
use domain::{DomainError, UnitOfWork};
use tracing::Instrument;

use super::{Behavior, Next};
use crate::request::Request;

/// Runs the rest of the chain inside one transaction of a unit of work.
///
/// Begin, the inner chain and commit run under the unit of work's execution
/// strategy and are replayed together on a transient failure. Any error from
/// the chain or from commit rolls the transaction back and is returned
/// unchanged. When the unit of work already has an active transaction the
/// chain runs inside it and nothing is begun or committed here.
#[derive(Clone)]
pub struct TransactionBehavior {
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl TransactionBehavior {
    pub fn new(unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self { unit_of_work }
    }
}

#[async_trait]
impl<R: Request> Behavior<R> for TransactionBehavior {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: R,
        next: Next<'_, R>,
    ) -> Result<R::Response, DomainError> {
        let uow = &self.unit_of_work;
        if uow.has_active_transaction() {
            return next.run(ctx, request).await;
        }

        let strategy = uow.execution_strategy();
        let result = strategy
            .execute(ctx, move || {
                let request = request.clone();
                async move {
                    let transaction = uow.begin_transaction(ctx).await?.ok_or_else(|| {
                        DomainError::InvalidOperation(
                            "unit of work began no transaction".to_string(),
                        )
                    })?;
                    let tx_ctx = ctx.in_transaction(transaction.id());
                    let span = tracing::info_span!(
                        "transaction",
                        transaction_id = %transaction.id(),
                        correlation_id = %ctx.correlation_id(),
                    );

                    let outcome = async {
                        tracing::info!(
                            "Begin transaction {} for {} ({:?})",
                            transaction.id(),
                            R::NAME,
                            request
                        );
                        let response = next.run(&tx_ctx, request).await?;
                        uow.commit_transaction(&transaction).await?;
                        tracing::info!("Commit transaction {} for {}", transaction.id(), R::NAME);
                        Ok::<_, DomainError>(response)
                    }
                    .instrument(span)
                    .await;

                    match outcome {
                        Ok(response) => {
                            metrics::counter!("transactions_committed_total").increment(1);
                            Ok(response)
                        }
                        Err(err) => {
                            uow.rollback_transaction().await;
                            metrics::counter!("transactions_rolled_back_total").increment(1);
                            Err(err)
                        }
                    }
                }
            })
            .await;

        if let Err(err) = &result {
            tracing::error!(
                correlation_id = %ctx.correlation_id(),
                error = %err,
                "Error handling transaction for {}",
                R::NAME
            );
        }
        result
    }
}
