use std::sync::Arc;

use async_trait::async_trait;
use common::RequestContext;
use domain::{DomainError, ServiceRequest, ServiceRequestRepository};

use crate::request::{Request, RequestHandler};

/// Query for every service request. Ordering is unspecified.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryAllServiceRequests;

impl Request for QueryAllServiceRequests {
    type Response = Vec<ServiceRequest>;
    const NAME: &'static str = "QueryAllServiceRequests";
}

pub struct QueryAllServiceRequestsHandler {
    repository: Arc<dyn ServiceRequestRepository>,
}

impl QueryAllServiceRequestsHandler {
    pub fn new(repository: Arc<dyn ServiceRequestRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl RequestHandler<QueryAllServiceRequests> for QueryAllServiceRequestsHandler {
    async fn handle(
        &self,
        _ctx: &RequestContext,
        _request: QueryAllServiceRequests,
    ) -> Result<Vec<ServiceRequest>, DomainError> {
        tracing::info!("Querying all service requests");
        let service_requests = self.repository.retrieve_all().await?;
        tracing::info!(count = service_requests.len(), "Queried all service requests");
        Ok(service_requests)
    }
}
