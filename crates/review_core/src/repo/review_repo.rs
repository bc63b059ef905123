//! Review repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Own the `reviews` table: schema, inserts, updates, deletes, reads.
//! - Hand raw rows upward; turning rows into canonical instances is the
//!   session's job.
//!
//! # Invariants
//! - Reads carry no ORDER BY: rows come back in storage order.
//! - Update/delete target rows by `id` only and report `NotFound` when no
//!   row matched.

use crate::model::employee::EmployeeId;
use crate::model::review::{Review, ReviewId};
use crate::repo::error::{RepoError, RepoResult};
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row};

const REVIEW_SELECT_SQL: &str = "SELECT id, year, summary, employee_id FROM reviews";

/// One `reviews` row as stored.
///
/// Data columns keep their raw SQLite values; SQLite does not enforce column
/// types, so decoding is part of validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRow {
    pub id: ReviewId,
    pub year: Value,
    pub summary: Value,
    pub employee_id: Value,
}

impl ReviewRow {
    /// Builds a row from already-typed values.
    pub fn new(
        id: ReviewId,
        year: i64,
        summary: impl Into<String>,
        employee_id: EmployeeId,
    ) -> Self {
        Self {
            id,
            year: Value::Integer(year),
            summary: Value::Text(summary.into()),
            employee_id: Value::Integer(employee_id),
        }
    }
}

/// Storage contract for reviews.
pub trait ReviewRepository {
    fn create_table(&self) -> RepoResult<()>;
    fn drop_table(&self) -> RepoResult<()>;
    /// Inserts the review's current fields and returns the generated id.
    fn insert_review(&self, review: &Review) -> RepoResult<ReviewId>;
    fn update_review(&self, review: &Review) -> RepoResult<()>;
    fn delete_review(&self, id: ReviewId) -> RepoResult<()>;
    fn get_review_row(&self, id: ReviewId) -> RepoResult<Option<ReviewRow>>;
    fn list_review_rows(&self) -> RepoResult<Vec<ReviewRow>>;
    fn list_review_rows_for_employee(&self, employee_id: EmployeeId)
        -> RepoResult<Vec<ReviewRow>>;
}

/// SQLite-backed review repository.
pub struct SqliteReviewRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReviewRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_rows(&self, sql: &str, params: impl rusqlite::Params) -> RepoResult<Vec<ReviewRow>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut reviews = Vec::new();
        while let Some(row) = rows.next()? {
            reviews.push(parse_review_row(row)?);
        }
        Ok(reviews)
    }
}

impl ReviewRepository for SqliteReviewRepository<'_> {
    fn create_table(&self) -> RepoResult<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS reviews (
                id INTEGER PRIMARY KEY,
                year INTEGER,
                summary TEXT,
                employee_id INTEGER,
                FOREIGN KEY (employee_id) REFERENCES employees(id)
            );",
        )?;
        info!("event=schema_create module=repo status=ok table=reviews");
        Ok(())
    }

    fn drop_table(&self) -> RepoResult<()> {
        self.conn.execute_batch("DROP TABLE IF EXISTS reviews;")?;
        info!("event=schema_drop module=repo status=ok table=reviews");
        Ok(())
    }

    fn insert_review(&self, review: &Review) -> RepoResult<ReviewId> {
        self.conn.execute(
            "INSERT INTO reviews (year, summary, employee_id) VALUES (?1, ?2, ?3);",
            params![review.year(), review.summary(), review.employee_id()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_review(&self, review: &Review) -> RepoResult<()> {
        let id = review.id().ok_or(RepoError::NotPersisted)?;
        let changed = self.conn.execute(
            "UPDATE reviews
             SET year = ?1, summary = ?2, employee_id = ?3
             WHERE id = ?4;",
            params![review.year(), review.summary(), review.employee_id(), id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete_review(&self, id: ReviewId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM reviews WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn get_review_row(&self, id: ReviewId) -> RepoResult<Option<ReviewRow>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{REVIEW_SELECT_SQL} WHERE id = ?1;"))?;
        let row = stmt.query_row([id], parse_review_row).optional()?;
        Ok(row)
    }

    fn list_review_rows(&self) -> RepoResult<Vec<ReviewRow>> {
        self.query_rows(&format!("{REVIEW_SELECT_SQL};"), [])
    }

    fn list_review_rows_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> RepoResult<Vec<ReviewRow>> {
        self.query_rows(
            &format!("{REVIEW_SELECT_SQL} WHERE employee_id = ?1;"),
            [employee_id],
        )
    }
}

fn parse_review_row(row: &Row<'_>) -> rusqlite::Result<ReviewRow> {
    Ok(ReviewRow {
        id: row.get("id")?,
        year: row.get("year")?,
        summary: row.get("summary")?,
        employee_id: row.get("employee_id")?,
    })
}
