//! Employee lookup contract and SQLite employee storage.
//!
//! # Responsibility
//! - Answer "does employee N exist" for review validation.
//! - Provide the small amount of employee CRUD the review layer needs
//!   around it (schema, insert, lookup, removal).
//!
//! # Invariants
//! - Lookups never cache: every call reflects current storage state.

use crate::model::employee::{Employee, EmployeeId};
use crate::repo::error::RepoResult;
use log::info;
use rusqlite::{params, Connection, OptionalExtension};

/// Lookup-by-id seam consulted whenever a review's `employee_id` is assigned.
pub trait EmployeeLookup {
    fn find_employee(&self, id: EmployeeId) -> RepoResult<Option<Employee>>;
}

impl<T: EmployeeLookup + ?Sized> EmployeeLookup for &T {
    fn find_employee(&self, id: EmployeeId) -> RepoResult<Option<Employee>> {
        (**self).find_employee(id)
    }
}

/// SQLite-backed employee repository over the `employees` table.
pub struct SqliteEmployeeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEmployeeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates `employees` when absent. Idempotent.
    pub fn create_table(&self) -> RepoResult<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS employees (
                id INTEGER PRIMARY KEY,
                name TEXT,
                job_title TEXT
            );",
        )?;
        info!("event=schema_create module=repo status=ok table=employees");
        Ok(())
    }

    /// Drops `employees` when present. Idempotent.
    pub fn drop_table(&self) -> RepoResult<()> {
        self.conn.execute_batch("DROP TABLE IF EXISTS employees;")?;
        info!("event=schema_drop module=repo status=ok table=employees");
        Ok(())
    }

    /// Validates and inserts a new employee, returning it with its id set.
    pub fn create_employee(
        &self,
        name: impl Into<String>,
        job_title: impl Into<String>,
    ) -> RepoResult<Employee> {
        let mut employee = Employee::new(name, job_title)?;
        self.conn.execute(
            "INSERT INTO employees (name, job_title) VALUES (?1, ?2);",
            params![employee.name(), employee.job_title()],
        )?;
        employee.assign_id(self.conn.last_insert_rowid());
        Ok(employee)
    }

    /// Deletes one employee row. Returns whether a row was removed.
    ///
    /// Reviews pointing at the employee are left untouched; the foreign key
    /// is declared but not enforced.
    pub fn delete_employee(&self, id: EmployeeId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM employees WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }
}

impl EmployeeLookup for SqliteEmployeeRepository<'_> {
    fn find_employee(&self, id: EmployeeId) -> RepoResult<Option<Employee>> {
        let employee = self
            .conn
            .query_row(
                "SELECT id, name, job_title FROM employees WHERE id = ?1;",
                [id],
                |row| {
                    Ok(Employee::from_row(
                        row.get("id")?,
                        row.get("name")?,
                        row.get("job_title")?,
                    ))
                },
            )
            .optional()?;
        Ok(employee)
    }
}
