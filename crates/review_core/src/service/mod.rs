//! Use-case layer built on repository contracts.
//!
//! # Invariants
//! - Services never issue SQL directly.
//! - Services stay storage-agnostic: every dependency is injected.

pub mod review_session;
