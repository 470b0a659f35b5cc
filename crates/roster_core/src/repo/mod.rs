//! Record store abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the keyed person store contract used by the service layer.
//! - Isolate SQLite details from orchestration logic.
//!
//! # Invariants
//! - Store APIs report duplicate keys as `RepoError::Duplicate`, distinct
//!   from transport/database failures.

pub mod memory_repo;
pub mod person_repo;
