//! Domain layer for the service request system.
//!
//! This crate provides the core domain abstractions including:
//! - Entity identity model with transience and a domain event buffer
//! - The `ServiceRequest` aggregate and its status enum
//! - Repository and unit-of-work contracts implemented by the persistence layer
//! - The retrying execution strategy a unit of work runs under

pub mod entity;
pub mod error;
pub mod execution;
pub mod repository;
pub mod service_request;
pub mod unit_of_work;

pub use entity::{DomainEvent, Entity, EntityCore};
pub use error::DomainError;
pub use execution::ExecutionStrategy;
pub use repository::{RepositoryFactory, ServiceRequestRepository};
pub use service_request::{CurrentStatus, ServiceRequest, ServiceRequestRecord};
pub use unit_of_work::{TransactionHandle, UnitOfWork};
