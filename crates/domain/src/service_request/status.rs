//! Service request status.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The current status of a service request.
///
/// Each status has a stable integer code used by storage and by callers that
/// submit statuses numerically. Any code outside `0..=4` is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum CurrentStatus {
    NotApplicable = 0,
    Created = 1,
    InProgress = 2,
    Complete = 3,
    Canceled = 4,
}

impl CurrentStatus {
    /// All statuses in code order.
    pub const ALL: [CurrentStatus; 5] = [
        CurrentStatus::NotApplicable,
        CurrentStatus::Created,
        CurrentStatus::InProgress,
        CurrentStatus::Complete,
        CurrentStatus::Canceled,
    ];

    /// Returns the integer code of this status.
    pub fn code(&self) -> i32 {
        *self as i32
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CurrentStatus::NotApplicable => "NotApplicable",
            CurrentStatus::Created => "Created",
            CurrentStatus::InProgress => "InProgress",
            CurrentStatus::Complete => "Complete",
            CurrentStatus::Canceled => "Canceled",
        }
    }

    fn rejected(value: impl std::fmt::Display) -> DomainError {
        DomainError::invalid_argument(
            "current_status",
            format!(
                "{value} is not a valid status; valid values are NotApplicable, Created, InProgress, Complete and Canceled"
            ),
        )
    }
}

impl std::fmt::Display for CurrentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<i32> for CurrentStatus {
    type Error = DomainError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        CurrentStatus::ALL
            .into_iter()
            .find(|status| status.code() == code)
            .ok_or_else(|| CurrentStatus::rejected(code))
    }
}

impl FromStr for CurrentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurrentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CurrentStatus::rejected(format!("'{s}'")))
    }
}

impl TryFrom<&str> for CurrentStatus {
    type Error = DomainError;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        name.parse()
    }
}
