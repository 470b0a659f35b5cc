//! Core domain logic for Roster.
//! This crate is the single source of truth for person record invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogOptions, LoggingError};
pub use model::patch::{merge, Patch, PersonChanges, PersonPatch};
pub use model::person::{wire_date, Person, PersonDraft, PersonId};
pub use model::validation::{validate_person, ErrorDetail, FieldViolation};
pub use repo::memory_repo::InMemoryPersonStore;
pub use repo::person_repo::{PersonStore, RepoError, RepoResult, SqlitePersonStore};
pub use service::clock::{Clock, FixedClock, SystemClock};
pub use service::eligibility::{full_years_between, AgePolicy};
pub use service::person_service::{PersonService, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
