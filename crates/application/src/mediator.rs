//! Static dispatch of requests to their pipelines.

use std::sync::Arc;

use common::RequestContext;
use domain::{DomainError, RepositoryFactory, ServiceRequestRepository, UnitOfWork};

use crate::behavior::{LoggingBehavior, TransactionBehavior};
use crate::commands::{
    CreateServiceRequest, CreateServiceRequestHandler, DeleteServiceRequestById,
    DeleteServiceRequestByIdHandler, UpdateServiceRequestById, UpdateServiceRequestByIdHandler,
};
use crate::pipeline::Pipeline;
use crate::queries::{
    QueryAllServiceRequests, QueryAllServiceRequestsHandler, QueryServiceRequestById,
    QueryServiceRequestByIdHandler,
};
use crate::request::{Request, RequestHandler};

/// Resolves the pipeline for a request type.
///
/// Implemented once per request type the mediator serves, so sending an
/// unregistered request type does not compile.
pub trait Dispatch<R: Request> {
    fn pipeline(&self) -> &Pipeline<R>;
}

/// Entry point for sending requests within one unit of work.
///
/// Every pipeline shares the repository (and therefore the unit of work) the
/// mediator was built for, and runs `LoggingBehavior` then
/// `TransactionBehavior` around its handler. Build one mediator per logical
/// request scope.
pub struct Mediator {
    unit_of_work: Arc<dyn UnitOfWork>,
    create: Pipeline<CreateServiceRequest>,
    update: Pipeline<UpdateServiceRequestById>,
    delete: Pipeline<DeleteServiceRequestById>,
    query_all: Pipeline<QueryAllServiceRequests>,
    query_by_id: Pipeline<QueryServiceRequestById>,
}

impl Mediator {
    /// Creates a mediator over an open repository scope.
    pub fn new(repository: Arc<dyn ServiceRequestRepository>) -> Self {
        let unit_of_work = repository.unit_of_work();
        Self {
            create: standard_pipeline(
                CreateServiceRequestHandler::new(repository.clone()),
                &unit_of_work,
            ),
            update: standard_pipeline(
                UpdateServiceRequestByIdHandler::new(repository.clone()),
                &unit_of_work,
            ),
            delete: standard_pipeline(
                DeleteServiceRequestByIdHandler::new(repository.clone()),
                &unit_of_work,
            ),
            query_all: standard_pipeline(
                QueryAllServiceRequestsHandler::new(repository.clone()),
                &unit_of_work,
            ),
            query_by_id: standard_pipeline(
                QueryServiceRequestByIdHandler::new(repository),
                &unit_of_work,
            ),
            unit_of_work,
        }
    }

    /// Opens a fresh scope from `factory` and builds a mediator over it.
    pub fn for_scope(factory: &dyn RepositoryFactory) -> Self {
        Self::new(factory.create_scope())
    }

    /// Returns the unit of work every pipeline runs against.
    pub fn unit_of_work(&self) -> &Arc<dyn UnitOfWork> {
        &self.unit_of_work
    }

    /// Sends a request with a fresh context.
    pub async fn send<R>(&self, request: R) -> Result<R::Response, DomainError>
    where
        R: Request,
        Self: Dispatch<R>,
    {
        self.send_with(&RequestContext::new(), request).await
    }

    /// Sends a request under the caller's context.
    ///
    /// Fails with `Cancelled` without running anything if the context is
    /// already cancelled.
    pub async fn send_with<R>(
        &self,
        ctx: &RequestContext,
        request: R,
    ) -> Result<R::Response, DomainError>
    where
        R: Request,
        Self: Dispatch<R>,
    {
        if ctx.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        <Self as Dispatch<R>>::pipeline(self)
            .send(ctx, request)
            .await
    }
}

fn standard_pipeline<R, H>(handler: H, unit_of_work: &Arc<dyn UnitOfWork>) -> Pipeline<R>
where
    R: Request,
    H: RequestHandler<R> + 'static,
{
    Pipeline::new(Arc::new(handler))
        .with_behavior(Arc::new(LoggingBehavior))
        .with_behavior(Arc::new(TransactionBehavior::new(unit_of_work.clone())))
}

impl Dispatch<CreateServiceRequest> for Mediator {
    fn pipeline(&self) -> &Pipeline<CreateServiceRequest> {
        &self.create
    }
}

impl Dispatch<UpdateServiceRequestById> for Mediator {
    fn pipeline(&self) -> &Pipeline<UpdateServiceRequestById> {
        &self.update
    }
}

impl Dispatch<DeleteServiceRequestById> for Mediator {
    fn pipeline(&self) -> &Pipeline<DeleteServiceRequestById> {
        &self.delete
    }
}

impl Dispatch<QueryAllServiceRequests> for Mediator {
    fn pipeline(&self) -> &Pipeline<QueryAllServiceRequests> {
        &self.query_all
    }
}

impl Dispatch<QueryServiceRequestById> for Mediator {
    fn pipeline(&self) -> &Pipeline<QueryServiceRequestById> {
        &self.query_by_id
    }
}
