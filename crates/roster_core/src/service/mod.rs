//! Service layer entry points.
//!
//! # Responsibility
//! - Orchestrate validation, eligibility and merging around the store.
//! - Keep business rules independent from transport and storage details.

pub mod clock;
pub mod eligibility;
pub mod person_service;
