//! Review domain model.
//!
//! # Responsibility
//! - Hold one annual performance review for one employee.
//! - Enforce field invariants on construction and on every assignment.
//!
//! # Invariants
//! - `year >= MIN_REVIEW_YEAR`.
//! - `summary` has at least one non-whitespace character. The stored value
//!   is the caller's string, untrimmed.
//! - `employee_id` resolved to an existing employee when it was assigned.
//!   Existence is checked live through an `EmployeeLookup`, not at save time.
//! - A setter that fails leaves the previous value in place.

use crate::model::employee::EmployeeId;
use crate::model::validation::{is_present, ValidationError};
use crate::repo::employee_repo::EmployeeLookup;
use crate::repo::error::RepoResult;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Row identifier of a review (`reviews.id`).
pub type ReviewId = i64;

/// First year accepted for a review.
pub const MIN_REVIEW_YEAR: i64 = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    id: Option<ReviewId>,
    year: i64,
    summary: String,
    employee_id: EmployeeId,
}

impl Review {
    /// Creates a transient review (`id == None`).
    ///
    /// # Errors
    /// - `RepoError::Validation` when any field violates its invariant.
    /// - `RepoError::Db` when the employee lookup itself fails.
    pub fn new<E>(
        year: i64,
        summary: impl Into<String>,
        employee_id: EmployeeId,
        employees: &E,
    ) -> RepoResult<Self>
    where
        E: EmployeeLookup + ?Sized,
    {
        Ok(Self {
            id: None,
            year: validate_year(year)?,
            summary: validate_summary(summary.into())?,
            employee_id: validate_employee_id(employee_id, employees)?,
        })
    }

    /// Creates a review carrying a caller-provided id.
    ///
    /// Used when hydrating rows that already exist in storage.
    pub fn with_id<E>(
        id: ReviewId,
        year: i64,
        summary: impl Into<String>,
        employee_id: EmployeeId,
        employees: &E,
    ) -> RepoResult<Self>
    where
        E: EmployeeLookup + ?Sized,
    {
        let mut review = Self::new(year, summary, employee_id, employees)?;
        review.id = Some(id);
        Ok(review)
    }

    pub fn id(&self) -> Option<ReviewId> {
        self.id
    }

    pub fn year(&self) -> i64 {
        self.year
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn employee_id(&self) -> EmployeeId {
        self.employee_id
    }

    /// Returns whether this review is currently tied to a stored row.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn set_year(&mut self, year: i64) -> Result<(), ValidationError> {
        self.year = validate_year(year)?;
        Ok(())
    }

    pub fn set_summary(&mut self, summary: impl Into<String>) -> Result<(), ValidationError> {
        self.summary = validate_summary(summary.into())?;
        Ok(())
    }

    /// Reassigns the review to another employee after a live existence check.
    pub fn set_employee_id<E>(
        &mut self,
        employee_id: EmployeeId,
        employees: &E,
    ) -> RepoResult<()>
    where
        E: EmployeeLookup + ?Sized,
    {
        self.employee_id = validate_employee_id(employee_id, employees)?;
        Ok(())
    }

    pub(crate) fn from_validated(
        id: Option<ReviewId>,
        year: i64,
        summary: String,
        employee_id: EmployeeId,
    ) -> Self {
        Self {
            id,
            year,
            summary,
            employee_id,
        }
    }

    /// Replaces every data field at once. Values must already be validated.
    pub(crate) fn overwrite_fields(
        &mut self,
        year: i64,
        summary: String,
        employee_id: EmployeeId,
    ) {
        self.year = year;
        self.summary = summary;
        self.employee_id = employee_id;
    }

    pub(crate) fn assign_id(&mut self, id: ReviewId) {
        self.id = Some(id);
    }

    pub(crate) fn clear_id(&mut self) {
        self.id = None;
    }
}

impl Display for Review {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.id {
            Some(id) => write!(f, "<Review {id}: ")?,
            None => write!(f, "<Review None: ")?,
        }
        write!(
            f,
            "{}, {}, Employee ID: {}>",
            self.year, self.summary, self.employee_id
        )
    }
}

pub fn validate_year(year: i64) -> Result<i64, ValidationError> {
    if year >= MIN_REVIEW_YEAR {
        Ok(year)
    } else {
        Err(ValidationError::YearTooEarly(year))
    }
}

pub fn validate_summary(summary: String) -> Result<String, ValidationError> {
    if is_present(&summary) {
        Ok(summary)
    } else {
        Err(ValidationError::BlankSummary)
    }
}

/// Checks that `employee_id` currently names a stored employee.
pub fn validate_employee_id<E>(employee_id: EmployeeId, employees: &E) -> RepoResult<EmployeeId>
where
    E: EmployeeLookup + ?Sized,
{
    match employees.find_employee(employee_id)? {
        Some(_) => Ok(employee_id),
        None => Err(ValidationError::UnknownEmployee(employee_id).into()),
    }
}
