//! Core data layer for employee performance reviews.
//! This crate owns the review invariants, the `reviews` table mapping and the
//! per-session identity cache.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::employee::{Employee, EmployeeId};
pub use model::review::{Review, ReviewId, MIN_REVIEW_YEAR};
pub use model::validation::ValidationError;
pub use repo::employee_repo::{EmployeeLookup, SqliteEmployeeRepository};
pub use repo::error::{RepoError, RepoResult};
pub use repo::review_repo::{ReviewRepository, ReviewRow, SqliteReviewRepository};
pub use service::review_session::{ReviewHandle, ReviewSession};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
