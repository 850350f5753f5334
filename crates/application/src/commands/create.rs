use std::sync::Arc;

use async_trait::async_trait;
use common::{EntityId, RequestContext};
use domain::{DomainError, Entity, ServiceRequest, ServiceRequestRepository};

use crate::request::{Request, RequestHandler};

/// Command to create a new service request.
///
/// The identity is chosen when the command is built, so a replayed unit of
/// work writes the same row again instead of a second one.
#[derive(Debug, Clone)]
pub struct CreateServiceRequest {
    pub id: EntityId,
    pub building_code: String,
    pub description: String,
    pub created_by: String,
}

impl CreateServiceRequest {
    /// Creates a new CreateServiceRequest command.
    pub fn new(
        building_code: impl Into<String>,
        description: impl Into<String>,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new(),
            building_code: building_code.into(),
            description: description.into(),
            created_by: created_by.into(),
        }
    }
}

impl Request for CreateServiceRequest {
    type Response = ServiceRequest;
    const NAME: &'static str = "CreateServiceRequest";
}

pub struct CreateServiceRequestHandler {
    repository: Arc<dyn ServiceRequestRepository>,
}

impl CreateServiceRequestHandler {
    pub fn new(repository: Arc<dyn ServiceRequestRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl RequestHandler<CreateServiceRequest> for CreateServiceRequestHandler {
    async fn handle(
        &self,
        _ctx: &RequestContext,
        request: CreateServiceRequest,
    ) -> Result<ServiceRequest, DomainError> {
        let mut service_request =
            ServiceRequest::new(request.building_code, request.description, request.created_by);
        service_request.assign_id(request.id)?;
        tracing::info!(?service_request, "Creating service request");

        let created = self.repository.create(service_request)?;
        tracing::info!(id = %created.id(), "Created service request");
        Ok(created)
    }
}
