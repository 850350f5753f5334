//! Storage for service requests.
//!
//! Two implementations of the domain's unit-of-work and repository contracts:
//! an in-memory database for tests and local runs, and PostgreSQL via `sqlx`.
//! Both stage changes in a [`ChangeTracker`] and write them on commit.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod tracker;

pub use error::{PersistenceError, Result};
pub use memory::{
    InMemoryContext, InMemoryDatabase, InMemoryServiceRequestRepository, TransactionStats,
};
pub use postgres::{PostgresContext, PostgresDatabase, PostgresServiceRequestRepository};
pub use tracker::{Change, ChangeTracker};
