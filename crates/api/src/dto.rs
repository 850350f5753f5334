//! Request and response bodies for the service request endpoints.

use application::{CreateServiceRequest, UpdateServiceRequestById};
use chrono::{DateTime, Utc};
use common::EntityId;
use domain::{CurrentStatus, Entity, ServiceRequest};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const MAX_BUILDING_CODE_LEN: usize = 32;
pub const MAX_DESCRIPTION_LEN: usize = 256;
pub const MAX_USER_LEN: usize = 32;

/// A service request as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequestDto {
    pub id: EntityId,
    pub building_code: String,
    pub description: String,
    pub current_status: CurrentStatus,
    pub created_by: String,
    pub created_date: DateTime<Utc>,
    pub last_modified_by: Option<String>,
    pub last_modified_date: Option<DateTime<Utc>>,
}

impl From<&ServiceRequest> for ServiceRequestDto {
    fn from(service_request: &ServiceRequest) -> Self {
        Self {
            id: service_request.id(),
            building_code: service_request.building_code().to_string(),
            description: service_request.description().to_string(),
            current_status: service_request.current_status(),
            created_by: service_request.created_by().to_string(),
            created_date: service_request.created_date(),
            last_modified_by: service_request.last_modified_by().map(str::to_string),
            last_modified_date: service_request.last_modified_date(),
        }
    }
}

/// Body of `POST /api/servicerequest`. Every field is required.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequestBody {
    pub building_code: Option<String>,
    pub created_by: Option<String>,
    pub description: Option<String>,
}

impl CreateServiceRequestBody {
    pub fn into_command(self) -> Result<CreateServiceRequest, ApiError> {
        Ok(CreateServiceRequest::new(
            required("buildingCode", self.building_code, MAX_BUILDING_CODE_LEN)?,
            required("description", self.description, MAX_DESCRIPTION_LEN)?,
            required("createdBy", self.created_by, MAX_USER_LEN)?,
        ))
    }
}

/// A status given by name (`"Complete"`) or by integer code (`3`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StatusValue {
    Code(i32),
    Name(String),
}

impl Default for StatusValue {
    fn default() -> Self {
        StatusValue::Code(CurrentStatus::NotApplicable.code())
    }
}

impl StatusValue {
    /// Returns the status code; unknown names are rejected, unknown codes are
    /// left for the aggregate to reject.
    pub fn code(&self) -> Result<i32, ApiError> {
        match self {
            StatusValue::Code(code) => Ok(*code),
            StatusValue::Name(name) => name
                .parse::<CurrentStatus>()
                .map(|status| status.code())
                .map_err(|err| ApiError::BadRequest(err.to_string())),
        }
    }
}

/// Body of `PUT /api/servicerequest/{id}`.
///
/// `modifiedBy` is required; absent building code or description keep the
/// stored values. A missing status means `NotApplicable`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequestBody {
    pub modified_by: Option<String>,
    pub building_code: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub current_status: StatusValue,
}

impl UpdateServiceRequestBody {
    pub fn into_command(self, id: EntityId) -> Result<UpdateServiceRequestById, ApiError> {
        Ok(UpdateServiceRequestById {
            id,
            modified_by: Some(required("modifiedBy", self.modified_by, MAX_USER_LEN)?),
            building_code: bounded("buildingCode", self.building_code, MAX_BUILDING_CODE_LEN)?,
            description: bounded("description", self.description, MAX_DESCRIPTION_LEN)?,
            current_status: self.current_status.code()?,
        })
    }
}

fn required(field: &str, value: Option<String>, max_len: usize) -> Result<String, ApiError> {
    match bounded(field, value, max_len)? {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ApiError::BadRequest(format!("The {field} field is required."))),
    }
}

fn bounded(field: &str, value: Option<String>, max_len: usize) -> Result<Option<String>, ApiError> {
    match value {
        Some(value) if value.chars().count() > max_len => Err(ApiError::BadRequest(format!(
            "The field {field} must be a string with a maximum length of {max_len}."
        ))),
        other => Ok(other),
    }
}
