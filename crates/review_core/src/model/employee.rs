//! Employee model.
//!
//! Employees are the target of the review foreign key. The review layer only
//! ever asks whether one exists; the shape here is what `employees` rows map to.

use crate::model::validation::{is_present, ValidationError};
use serde::Serialize;

/// Row identifier of an employee (`employees.id`).
pub type EmployeeId = i64;

/// Fields are private: new values only come from `Employee::new` (validated)
/// or from stored rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Employee {
    id: Option<EmployeeId>,
    name: String,
    job_title: String,
}

impl Employee {
    /// Creates a transient employee.
    ///
    /// # Errors
    /// - `BlankName` / `BlankJobTitle` for whitespace-only values.
    pub fn new(
        name: impl Into<String>,
        job_title: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let employee = Self {
            id: None,
            name: name.into(),
            job_title: job_title.into(),
        };
        employee.validate()?;
        Ok(employee)
    }

    /// `None` until inserted.
    pub fn id(&self) -> Option<EmployeeId> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn job_title(&self) -> &str {
        &self.job_title
    }

    pub(crate) fn from_row(id: EmployeeId, name: String, job_title: String) -> Self {
        Self {
            id: Some(id),
            name,
            job_title,
        }
    }

    pub(crate) fn assign_id(&mut self, id: EmployeeId) {
        self.id = Some(id);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if !is_present(&self.name) {
            return Err(ValidationError::BlankName);
        }
        if !is_present(&self.job_title) {
            return Err(ValidationError::BlankJobTitle);
        }
        Ok(())
    }
}
