//! Person domain model.
//!
//! # Responsibility
//! - Define the canonical person record and its wire shapes.
//! - Own structural validation and the partial-update merger.
//!
//! # Invariants
//! - Every record is identified by its unique `email`.
//! - Required fields can never be cleared by a partial update.

pub mod patch;
pub mod person;
pub mod validation;
