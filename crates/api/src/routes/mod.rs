pub mod health;
pub mod metrics;
pub mod service_requests;
