use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{EntityId, RequestContext};
use domain::{DomainError, ServiceRequest, ServiceRequestRepository};

use crate::request::{Request, RequestHandler};

/// Command to update a service request by id.
///
/// Absent or blank building code and description leave the stored values as
/// they are. The status is carried as its raw code and validated by the
/// aggregate.
#[derive(Debug, Clone)]
pub struct UpdateServiceRequestById {
    pub id: EntityId,
    pub modified_by: Option<String>,
    pub building_code: Option<String>,
    pub description: Option<String>,
    pub current_status: i32,
}

impl Request for UpdateServiceRequestById {
    type Response = Option<ServiceRequest>;
    const NAME: &'static str = "UpdateServiceRequestById";
}

pub struct UpdateServiceRequestByIdHandler {
    repository: Arc<dyn ServiceRequestRepository>,
}

impl UpdateServiceRequestByIdHandler {
    pub fn new(repository: Arc<dyn ServiceRequestRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl RequestHandler<UpdateServiceRequestById> for UpdateServiceRequestByIdHandler {
    async fn handle(
        &self,
        _ctx: &RequestContext,
        request: UpdateServiceRequestById,
    ) -> Result<Option<ServiceRequest>, DomainError> {
        tracing::info!(id = %request.id, ?request, "Updating service request");

        let Some(mut service_request) = self.repository.retrieve_by_id(request.id).await? else {
            tracing::info!(id = %request.id, "Service request not found");
            return Ok(None);
        };

        // setter order matters: a rejected status leaves the earlier fields changed
        // in memory only, and the surrounding transaction discards them
        service_request.set_last_modified_by(request.modified_by.as_deref().unwrap_or_default())?;
        service_request.set_last_modified_date(Utc::now());
        service_request.set_building_code(request.building_code.as_deref().unwrap_or_default());
        service_request.set_description(request.description.as_deref().unwrap_or_default());
        service_request.set_current_status(request.current_status)?;

        self.repository.update(&service_request);
        tracing::info!(id = %request.id, "Updated service request");
        Ok(Some(service_request))
    }
}
