//! Application layer for the service request system.
//!
//! Requests are dispatched by the [`Mediator`] to a [`Pipeline`] per request
//! type: a handler wrapped by an ordered list of [`Behavior`]s, composed once
//! when the mediator is built. The standard chain logs the request, then runs
//! the handler inside one transaction of the scope's unit of work, retrying
//! the whole unit on transient storage failures.

pub mod behavior;
pub mod commands;
pub mod mediator;
pub mod pipeline;
pub mod queries;
pub mod request;

pub use behavior::{Behavior, LoggingBehavior, Next, TransactionBehavior};
pub use commands::{
    CreateServiceRequest, CreateServiceRequestHandler, DeleteServiceRequestById,
    DeleteServiceRequestByIdHandler, UpdateServiceRequestById, UpdateServiceRequestByIdHandler,
};
pub use mediator::{Dispatch, Mediator};
pub use pipeline::Pipeline;
pub use queries::{
    QueryAllServiceRequests, QueryAllServiceRequestsHandler, QueryServiceRequestById,
    QueryServiceRequestByIdHandler,
};
pub use request::{Request, RequestHandler};
