//! Requests that change service requests.

mod create;
mod delete;
mod update;

pub use create::{CreateServiceRequest, CreateServiceRequestHandler};
pub use delete::{DeleteServiceRequestById, DeleteServiceRequestByIdHandler};
pub use update::{UpdateServiceRequestById, UpdateServiceRequestByIdHandler};
