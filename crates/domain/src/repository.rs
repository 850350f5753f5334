//! Repository contracts for the service request aggregate.

use std::sync::Arc;

use async_trait::async_trait;
use common::EntityId;

use crate::error::DomainError;
use crate::service_request::ServiceRequest;
use crate::unit_of_work::UnitOfWork;

/// Persistence capabilities handlers use for service requests.
///
/// Mutating operations are staged against the repository's unit of work and are
/// not visible to other units of work until it commits.
#[async_trait]
pub trait ServiceRequestRepository: Send + Sync {
    /// Returns the unit of work this repository stages into.
    fn unit_of_work(&self) -> Arc<dyn UnitOfWork>;

    /// Stages an insert and returns the instance with its store-assigned identity.
    fn create(&self, service_request: ServiceRequest) -> Result<ServiceRequest, DomainError>;

    /// Returns every service request. Ordering is unspecified.
    async fn retrieve_all(&self) -> Result<Vec<ServiceRequest>, DomainError>;

    /// Returns the service request with the given id, if it exists.
    async fn retrieve_by_id(&self, id: EntityId) -> Result<Option<ServiceRequest>, DomainError>;

    /// Stages the new state of a service request retrieved or created through
    /// this repository. Instances it does not track are ignored.
    fn update(&self, service_request: &ServiceRequest);

    /// Stages the removal of a service request.
    fn delete(&self, service_request: &ServiceRequest);
}

/// Opens a fresh repository (and unit of work) per logical request scope.
pub trait RepositoryFactory: Send + Sync {
    fn create_scope(&self) -> Arc<dyn ServiceRequestRepository>;
}
