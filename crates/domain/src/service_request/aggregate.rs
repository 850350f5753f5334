//! Service request aggregate implementation.

use chrono::{DateTime, Utc};
use common::EntityId;
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityCore};
use crate::error::DomainError;

use super::CurrentStatus;

/// Service request aggregate root.
///
/// A request for service against a building. Fields are private; every change
/// goes through a named setter so the invariants live in one place:
/// - creator and creation date never change after construction
/// - building code and description are only replaced by non-blank input
/// - the last modifier, once set, is never blank
#[derive(Debug, Clone)]
pub struct ServiceRequest {
    entity: EntityCore,
    building_code: String,
    description: String,
    current_status: CurrentStatus,
    created_by: String,
    created_date: DateTime<Utc>,
    last_modified_by: Option<String>,
    last_modified_date: Option<DateTime<Utc>>,
}

/// Persisted shape of a service request.
///
/// Used by stores to save and rehydrate the aggregate; domain events are not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRequestRecord {
    pub id: EntityId,
    pub building_code: String,
    pub description: String,
    pub current_status: CurrentStatus,
    pub created_by: String,
    pub created_date: DateTime<Utc>,
    pub last_modified_by: Option<String>,
    pub last_modified_date: Option<DateTime<Utc>>,
}

impl Entity for ServiceRequest {
    fn core(&self) -> &EntityCore {
        &self.entity
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.entity
    }
}

impl PartialEq for ServiceRequest {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity_as(other)
    }
}

impl ServiceRequest {
    /// Creates a transient service request with status `Created`.
    pub fn new(
        building_code: impl Into<String>,
        description: impl Into<String>,
        created_by: impl Into<String>,
    ) -> Self {
        Self::with_status(building_code, description, created_by, CurrentStatus::Created)
    }

    /// Creates a transient service request with an explicit initial status.
    pub fn with_status(
        building_code: impl Into<String>,
        description: impl Into<String>,
        created_by: impl Into<String>,
        current_status: CurrentStatus,
    ) -> Self {
        Self {
            entity: EntityCore::transient(),
            building_code: building_code.into(),
            description: description.into(),
            current_status,
            created_by: created_by.into(),
            created_date: Utc::now(),
            last_modified_by: None,
            last_modified_date: None,
        }
    }

    /// Rehydrates a persisted service request.
    pub fn from_record(record: ServiceRequestRecord) -> Self {
        Self {
            entity: EntityCore::with_id(record.id),
            building_code: record.building_code,
            description: record.description,
            current_status: record.current_status,
            created_by: record.created_by,
            created_date: record.created_date,
            last_modified_by: record.last_modified_by,
            last_modified_date: record.last_modified_date,
        }
    }

    /// Captures the persisted shape of this service request.
    pub fn to_record(&self) -> ServiceRequestRecord {
        ServiceRequestRecord {
            id: self.id(),
            building_code: self.building_code.clone(),
            description: self.description.clone(),
            current_status: self.current_status,
            created_by: self.created_by.clone(),
            created_date: self.created_date,
            last_modified_by: self.last_modified_by.clone(),
            last_modified_date: self.last_modified_date,
        }
    }
}

// Query methods
impl ServiceRequest {
    pub fn building_code(&self) -> &str {
        &self.building_code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn current_status(&self) -> CurrentStatus {
        self.current_status
    }

    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    pub fn created_date(&self) -> DateTime<Utc> {
        self.created_date
    }

    pub fn last_modified_by(&self) -> Option<&str> {
        self.last_modified_by.as_deref()
    }

    pub fn last_modified_date(&self) -> Option<DateTime<Utc>> {
        self.last_modified_date
    }
}

// Mutation methods
impl ServiceRequest {
    /// Sets the building code. Blank input is ignored.
    pub fn set_building_code(&mut self, building_code: &str) {
        if !building_code.trim().is_empty() {
            self.building_code = building_code.to_string();
        }
    }

    /// Sets the description. Blank input is ignored.
    pub fn set_description(&mut self, description: &str) {
        if !description.trim().is_empty() {
            self.description = description.to_string();
        }
    }

    /// Sets the current status.
    ///
    /// Accepts a `CurrentStatus` directly, or a raw integer code / name that is
    /// validated first. A value outside the five statuses fails with
    /// `InvalidArgument` and leaves the status unchanged.
    pub fn set_current_status<S>(&mut self, current_status: S) -> Result<(), DomainError>
    where
        S: TryInto<CurrentStatus>,
        DomainError: From<<S as TryInto<CurrentStatus>>::Error>,
    {
        self.current_status = current_status.try_into()?;
        Ok(())
    }

    /// Sets who last modified the service request.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `modified_by` is empty or whitespace.
    pub fn set_last_modified_by(&mut self, modified_by: &str) -> Result<(), DomainError> {
        if modified_by.trim().is_empty() {
            return Err(DomainError::invalid_argument(
                "modified_by",
                "the value cannot be empty or white space",
            ));
        }
        self.last_modified_by = Some(modified_by.to_string());
        Ok(())
    }

    /// Sets when the service request was last modified.
    pub fn set_last_modified_date(&mut self, modified_date: DateTime<Utc>) {
        self.last_modified_date = Some(modified_date);
    }
}
