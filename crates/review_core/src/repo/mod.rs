//! Repository layer: storage contracts and their SQLite implementations.
//!
//! # Responsibility
//! - Define the data access contracts the review session depends on.
//! - Keep SQL text and row decoding inside the persistence boundary.
//!
//! # Invariants
//! - Each write is one autocommitted statement.
//! - Repositories return semantic errors (`NotFound`) in addition to
//!   transport errors, and never cache.

pub mod employee_repo;
pub mod error;
pub mod review_repo;
