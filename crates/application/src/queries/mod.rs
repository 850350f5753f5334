//! Read-only requests.

mod all;
mod by_id;

pub use all::{QueryAllServiceRequests, QueryAllServiceRequestsHandler};
pub use by_id::{QueryServiceRequestById, QueryServiceRequestByIdHandler};
