//! Field validation errors shared by review and employee models.

use crate::model::employee::EmployeeId;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Raised when a field value violates its invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `year` is below the first accepted review year.
    YearTooEarly(i64),
    /// `summary` is empty or whitespace-only.
    BlankSummary,
    /// `employee_id` does not resolve to an existing employee.
    UnknownEmployee(EmployeeId),
    /// A persisted column expected to hold an integer holds something else.
    NotInteger { field: &'static str },
    /// A persisted column expected to hold text holds something else.
    NotText { field: &'static str },
    /// Employee `name` is empty or whitespace-only.
    BlankName,
    /// Employee `job_title` is empty or whitespace-only.
    BlankJobTitle,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::YearTooEarly(year) => {
                write!(f, "year must be an integer >= 2000, got {year}")
            }
            Self::BlankSummary => write!(f, "summary must be a non-empty string"),
            Self::UnknownEmployee(id) => {
                write!(f, "employee_id {id} must reference an existing employee")
            }
            Self::NotInteger { field } => write!(f, "{field} must be an integer"),
            Self::NotText { field } => write!(f, "{field} must be a string"),
            Self::BlankName => write!(f, "name must be a non-empty string"),
            Self::BlankJobTitle => write!(f, "job_title must be a non-empty string"),
        }
    }
}

impl Error for ValidationError {}

/// Returns `true` when `value` has at least one non-whitespace character.
pub(crate) fn is_present(value: &str) -> bool {
    !value.trim().is_empty()
}
