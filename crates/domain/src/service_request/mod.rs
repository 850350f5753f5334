//! Service request aggregate and related types.

mod aggregate;
mod status;

pub use aggregate::{ServiceRequest, ServiceRequestRecord};
pub use status::CurrentStatus;
