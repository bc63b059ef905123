//! Domain model for reviews and the employees they belong to.
//!
//! # Responsibility
//! - Define the in-memory shapes mapped onto `reviews` and `employees` rows.
//! - Keep every field invariant behind a validating constructor or setter.
//!
//! # Invariants
//! - A `Review` value can only hold fields that passed validation.
//! - `id` is `None` until the row exists in storage.

pub mod employee;
pub mod review;
pub mod validation;
