use std::sync::Arc;

use async_trait::async_trait;
use common::{EntityId, RequestContext};
use domain::{DomainError, ServiceRequest, ServiceRequestRepository};

use crate::request::{Request, RequestHandler};

/// Query for one service request.
#[derive(Debug, Clone, Copy)]
pub struct QueryServiceRequestById {
    pub id: EntityId,
}

impl QueryServiceRequestById {
    pub fn new(id: EntityId) -> Self {
        Self { id }
    }
}

impl Request for QueryServiceRequestById {
    type Response = Option<ServiceRequest>;
    const NAME: &'static str = "QueryServiceRequestById";
}

pub struct QueryServiceRequestByIdHandler {
    repository: Arc<dyn ServiceRequestRepository>,
}

impl QueryServiceRequestByIdHandler {
    pub fn new(repository: Arc<dyn ServiceRequestRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl RequestHandler<QueryServiceRequestById> for QueryServiceRequestByIdHandler {
    async fn handle(
        &self,
        _ctx: &RequestContext,
        request: QueryServiceRequestById,
    ) -> Result<Option<ServiceRequest>, DomainError> {
        tracing::info!(id = %request.id, "Querying service request");
        let service_request = self.repository.retrieve_by_id(request.id).await?;
        if service_request.is_none() {
            tracing::info!(id = %request.id, "Service request not found");
        }
        Ok(service_request)
    }
}

#[cfg(test)]
mod tests {
    use domain::{Entity, RepositoryFactory};
    use persistence::InMemoryDatabase;

    use super::*;

    #[tokio::test]
    async fn test_finds_existing_and_misses_unknown() {
        let db = InMemoryDatabase::new();
        let mut existing = ServiceRequest::new("123", "Turn up the heat!", "Aaron");
        existing.assign_id(EntityId::new()).unwrap();
        db.seed([existing.to_record()]).await;
        let handler = QueryServiceRequestByIdHandler::new(db.create_scope());
        let ctx = RequestContext::new();

        let found = handler
            .handle(&ctx, QueryServiceRequestById::new(existing.id()))
            .await
            .unwrap();
        let missing = handler
            .handle(&ctx, QueryServiceRequestById::new(EntityId::new()))
            .await
            .unwrap();

        assert!(found == Some(existing));
        assert!(missing.is_none());
    }
}
