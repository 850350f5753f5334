use std::sync::Arc;

use async_trait::async_trait;
use common::{EntityId, RequestContext};
use domain::{DomainError, ServiceRequestRepository};

use crate::request::{Request, RequestHandler};

/// Command to delete a service request by id.
#[derive(Debug, Clone)]
pub struct DeleteServiceRequestById {
    pub id: EntityId,
}

impl DeleteServiceRequestById {
    pub fn new(id: EntityId) -> Self {
        Self { id }
    }
}

impl Request for DeleteServiceRequestById {
    /// True once the removal is staged; the row is only gone after commit.
    type Response = bool;
    const NAME: &'static str = "DeleteServiceRequestById";
}

pub struct DeleteServiceRequestByIdHandler {
    repository: Arc<dyn ServiceRequestRepository>,
}

impl DeleteServiceRequestByIdHandler {
    pub fn new(repository: Arc<dyn ServiceRequestRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl RequestHandler<DeleteServiceRequestById> for DeleteServiceRequestByIdHandler {
    async fn handle(
        &self,
        _ctx: &RequestContext,
        request: DeleteServiceRequestById,
    ) -> Result<bool, DomainError> {
        tracing::info!(id = %request.id, "Deleting service request");

        let Some(service_request) = self.repository.retrieve_by_id(request.id).await? else {
            tracing::info!(id = %request.id, "Service request not found");
            return Ok(false);
        };

        self.repository.delete(&service_request);
        tracing::info!(id = %request.id, "Service request deleted");
        Ok(true)
    }
}
