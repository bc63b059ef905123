//! Review entity manager with a per-session identity cache.
//!
//! # Responsibility
//! - Map `reviews` rows to live, shared `Review` instances.
//! - Provide save/create/find/list/update/delete for reviews.
//!
//! # Invariants
//! - At most one live instance per row id within a session: re-reading a
//!   cached row refreshes that instance in place and returns the same handle.
//! - The cache has no eviction; only `delete` and `drop_table` remove entries.
//! - Sessions are single-threaded (`Rc<RefCell<_>>` keeps them `!Send`).
//! - Operations that write an instance (`save`, `delete`, refreshing a cached
//!   row) fail with `InstanceBorrowed` while the caller holds any borrow of
//!   that handle; `update` fails only under a caller-held `borrow_mut`.
//! - A cache slot taken over by a reused rowid detaches the previous
//!   instance (its id is reset), so it can no longer target the new row.

use crate::model::employee::EmployeeId;
use crate::model::review::{
    validate_employee_id, validate_summary, validate_year, Review, ReviewId,
};
use crate::model::validation::ValidationError;
use crate::repo::employee_repo::EmployeeLookup;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::review_repo::{ReviewRepository, ReviewRow};
use log::{debug, warn};
use rusqlite::types::Value;
use std::cell::{RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to the canonical in-memory instance of a review.
///
/// Identity is pointer identity: compare handles with `Rc::ptr_eq`.
pub type ReviewHandle = Rc<RefCell<Review>>;

pub struct ReviewSession<R: ReviewRepository, E: EmployeeLookup> {
    reviews: R,
    employees: E,
    cache: HashMap<ReviewId, ReviewHandle>,
}

impl<R: ReviewRepository, E: EmployeeLookup> ReviewSession<R, E> {
    /// Creates a session with an empty identity cache.
    pub fn new(reviews: R, employees: E) -> Self {
        Self {
            reviews,
            employees,
            cache: HashMap::new(),
        }
    }

    /// Employee lookup used to validate `employee_id` assignments.
    pub fn employees(&self) -> &E {
        &self.employees
    }

    pub fn create_table(&self) -> RepoResult<()> {
        self.reviews.create_table()
    }

    /// Drops `reviews` and forgets every cached instance.
    pub fn drop_table(&mut self) -> RepoResult<()> {
        self.reviews.drop_table()?;
        self.cache.clear();
        Ok(())
    }

    /// Builds a transient review validated against this session's employees.
    pub fn new_review(
        &self,
        year: i64,
        summary: impl Into<String>,
        employee_id: EmployeeId,
    ) -> RepoResult<ReviewHandle> {
        let review = Review::new(year, summary, employee_id, &self.employees)?;
        Ok(Rc::new(RefCell::new(review)))
    }

    /// Inserts a transient review and registers it in the cache.
    ///
    /// # Errors
    /// - `AlreadyPersisted` when the review already has an id.
    /// - `InstanceBorrowed` when the caller holds a borrow of `review`.
    pub fn save(&mut self, review: &ReviewHandle) -> RepoResult<ReviewId> {
        let mut current = borrow_for_write(review)?;
        if let Some(id) = current.id() {
            return Err(RepoError::AlreadyPersisted(id));
        }

        let id = self.reviews.insert_review(&current)?;
        current.assign_id(id);
        drop(current);

        // SQLite hands out a deleted max rowid again.
        if let Some(stale) = self.cache.insert(id, Rc::clone(review)) {
            detach_stale(&stale, id);
        }
        debug!("event=review_save module=service status=ok review_id={id}");
        Ok(id)
    }

    /// Constructs and saves a review in one step.
    pub fn create(
        &mut self,
        year: i64,
        summary: impl Into<String>,
        employee_id: EmployeeId,
    ) -> RepoResult<ReviewHandle> {
        let review = self.new_review(year, summary, employee_id)?;
        self.save(&review)?;
        Ok(review)
    }

    /// Returns the canonical instance for a stored row.
    ///
    /// Every field is validated before anything is touched, so a row that
    /// fails validation leaves a cached instance unchanged.
    pub fn instance_from_db(&mut self, row: ReviewRow) -> RepoResult<ReviewHandle> {
        let year = validate_year(integer_column(&row.year, "year")?)?;
        let summary = validate_summary(text_column(row.summary, "summary")?)?;
        let employee_id = validate_employee_id(
            integer_column(&row.employee_id, "employee_id")?,
            &self.employees,
        )?;

        if let Some(cached) = self.cache.get(&row.id) {
            borrow_for_write(cached)?.overwrite_fields(year, summary, employee_id);
            debug!(
                "event=review_cache_hit module=service status=ok review_id={}",
                row.id
            );
            return Ok(Rc::clone(cached));
        }

        let review = Rc::new(RefCell::new(Review::from_validated(
            Some(row.id),
            year,
            summary,
            employee_id,
        )));
        self.cache.insert(row.id, Rc::clone(&review));
        Ok(review)
    }

    pub fn find_by_id(&mut self, id: ReviewId) -> RepoResult<Option<ReviewHandle>> {
        match self.reviews.get_review_row(id)? {
            Some(row) => Ok(Some(self.instance_from_db(row)?)),
            None => Ok(None),
        }
    }

    /// Returns every stored review in storage order.
    pub fn get_all(&mut self) -> RepoResult<Vec<ReviewHandle>> {
        let rows = self.reviews.list_review_rows()?;
        self.instances_from_rows(rows)
    }

    /// Returns every stored review written for one employee.
    pub fn reviews_for_employee(
        &mut self,
        employee_id: EmployeeId,
    ) -> RepoResult<Vec<ReviewHandle>> {
        let rows = self.reviews.list_review_rows_for_employee(employee_id)?;
        self.instances_from_rows(rows)
    }

    /// Writes the review's current fields over its stored row.
    ///
    /// # Errors
    /// - `NotPersisted` when the review has no id.
    /// - `NotFound` when the row no longer exists.
    /// - `InstanceBorrowed` when the caller holds a `borrow_mut` of `review`.
    pub fn update(&self, review: &ReviewHandle) -> RepoResult<()> {
        let review = review
            .try_borrow()
            .map_err(|_| RepoError::InstanceBorrowed(None))?;
        let id = review.id().ok_or(RepoError::NotPersisted)?;
        self.reviews.update_review(&review)?;
        debug!("event=review_update module=service status=ok review_id={id}");
        Ok(())
    }

    /// Deletes the stored row, evicts the cache entry and resets the id.
    ///
    /// The instance stays usable afterwards as a transient review.
    pub fn delete(&mut self, review: &ReviewHandle) -> RepoResult<()> {
        let mut current = borrow_for_write(review)?;
        let id = current.id().ok_or(RepoError::NotPersisted)?;
        self.reviews.delete_review(id)?;
        self.cache.remove(&id);
        current.clear_id();
        debug!("event=review_delete module=service status=ok review_id={id}");
        Ok(())
    }

    /// Returns the cached instance for `id` without touching storage.
    pub fn cached(&self, id: ReviewId) -> Option<ReviewHandle> {
        self.cache.get(&id).cloned()
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    fn instances_from_rows(&mut self, rows: Vec<ReviewRow>) -> RepoResult<Vec<ReviewHandle>> {
        rows.into_iter()
            .map(|row| self.instance_from_db(row))
            .collect()
    }
}

fn borrow_for_write(review: &ReviewHandle) -> RepoResult<RefMut<'_, Review>> {
    review.try_borrow_mut().map_err(|_| {
        let id = review.try_borrow().ok().and_then(|current| current.id());
        RepoError::InstanceBorrowed(id)
    })
}

fn detach_stale(stale: &ReviewHandle, id: ReviewId) {
    match stale.try_borrow_mut() {
        Ok(mut stale) => stale.clear_id(),
        Err(_) => warn!(
            "event=review_cache_evict module=service status=error review_id={id} error_code=instance_borrowed"
        ),
    }
}

fn integer_column(value: &Value, field: &'static str) -> Result<i64, ValidationError> {
    match value {
        Value::Integer(value) => Ok(*value),
        _ => Err(ValidationError::NotInteger { field }),
    }
}

fn text_column(value: Value, field: &'static str) -> Result<String, ValidationError> {
    match value {
        Value::Text(value) => Ok(value),
        _ => Err(ValidationError::NotText { field }),
    }
}
