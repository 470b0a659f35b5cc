//! Person use-case service.
//!
//! # Responsibility
//! - Implement lookup, create, full replace, partial update, delete and
//!   birth-date range search over a `PersonStore`.
//! - Enforce identity uniqueness, not-found semantics, structural
//!   validation and the minimum-age rule on every write path.
//!
//! # Invariants
//! - Every rejected precondition yields exactly one `ServiceError`.
//! - The service holds no mutable state; concurrent calls only meet in the
//!   store, whose duplicate-key failures map to `Conflict`.
//! - Eligibility is evaluated on the record that would be stored.

use crate::model::patch::{merge, PersonPatch};
use crate::model::person::{Person, PersonDraft, PersonId};
use crate::model::validation::{validate_person, ErrorDetail, FieldViolation, MSG_PAST_DATE};
use crate::repo::person_repo::{PersonStore, RepoError};
use crate::service::clock::{Clock, SystemClock};
use crate::service::eligibility::AgePolicy;
use chrono::NaiveDate;
use log::{info, warn};
use std::sync::Arc;
use std::time::Instant;

pub const MSG_RANGE_ORDER: &str = "toDate must be after fromDate";
/// Object name reported for range query violations.
pub const OBJECT_SEARCH: &str = "searchQuery";

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Typed outcome of a rejected person operation.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// No record under the requested identity.
    #[error("User with email {0} not found")]
    NotFound(PersonId),
    /// Identity already taken (create or move target).
    #[error("{0}")]
    Conflict(String),
    /// Field-level structural violations.
    #[error("{0}")]
    ValidationFailed(ErrorDetail),
    /// Single-message business rule failure.
    #[error("{0}")]
    BusinessRuleViolation(String),
    /// Store failure; not retried here.
    #[error("record store unavailable: {0}")]
    StoreUnavailable(#[source] RepoError),
}

impl ServiceError {
    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::ValidationFailed(_) => "validation_failed",
            Self::BusinessRuleViolation(_) => "business_rule",
            Self::StoreUnavailable(_) => "store_unavailable",
        }
    }

    fn already_exists(email: &str) -> Self {
        Self::Conflict(format!("User with id {email} already exists."))
    }

    fn move_target_taken(email: &str) -> Self {
        Self::Conflict(format!("User with email {email} already exists. Cannot update."))
    }
}

impl From<ErrorDetail> for ServiceError {
    fn from(value: ErrorDetail) -> Self {
        Self::ValidationFailed(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Duplicate(email) => Self::already_exists(&email),
            RepoError::NotFound(email) => Self::NotFound(email),
            other => Self::StoreUnavailable(other),
        }
    }
}

/// Use-case service over a person store.
pub struct PersonService<S: PersonStore> {
    store: S,
    policy: AgePolicy,
    clock: Arc<dyn Clock>,
}

impl<S: PersonStore> PersonService<S> {
    /// Creates a service that reads dates from the system clock.
    pub fn new(store: S, policy: AgePolicy) -> Self {
        Self::with_clock(store, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, policy: AgePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> AgePolicy {
        self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads one record by identity.
    pub async fn find(&self, email: &str) -> ServiceResult<Person> {
        self.store
            .get(email)
            .await?
            .ok_or_else(|| ServiceError::NotFound(email.to_string()))
    }

    /// Creates a new record.
    ///
    /// # Errors
    /// - `ValidationFailed` for structural violations.
    /// - `BusinessRuleViolation` when the person is too young.
    /// - `Conflict` when the identity is already stored.
    pub async fn create(&self, draft: PersonDraft) -> ServiceResult<Person> {
        let started_at = Instant::now();
        let result = self.create_inner(draft).await;
        log_outcome("person_create", started_at, &result);
        result
    }

    async fn create_inner(&self, draft: PersonDraft) -> ServiceResult<Person> {
        let today = self.clock.today();
        let person = draft.into_person(today)?;
        self.ensure_eligible(person.birth_date, today)?;

        if self.store.get(&person.email).await?.is_some() {
            return Err(ServiceError::already_exists(&person.email));
        }

        // A concurrent create can still win the key; insert fails with
        // Duplicate and maps to the same conflict.
        Ok(self.store.insert(&person).await?)
    }

    /// Replaces the record under `target`, moving it when the identity
    /// changes.
    ///
    /// # Errors
    /// - `NotFound` when `target` is not stored.
    /// - `ValidationFailed` / `BusinessRuleViolation` for invalid records.
    /// - `Conflict` when moving onto an identity that is already stored.
    pub async fn replace(&self, target: &str, draft: PersonDraft) -> ServiceResult<Person> {
        let started_at = Instant::now();
        let result = self.replace_inner(target, draft).await;
        log_outcome("person_replace", started_at, &result);
        result
    }

    async fn replace_inner(&self, target: &str, draft: PersonDraft) -> ServiceResult<Person> {
        self.find(target).await?;

        let today = self.clock.today();
        let person = draft.into_person(today)?;
        self.ensure_eligible(person.birth_date, today)?;

        if person.email == target {
            return Ok(self.store.upsert(&person).await?);
        }

        if self.store.get(&person.email).await?.is_some() {
            return Err(ServiceError::move_target_taken(&person.email));
        }

        match self.store.relocate(target, &person).await {
            Ok(stored) => Ok(stored),
            Err(RepoError::Duplicate(email)) => Err(ServiceError::move_target_taken(&email)),
            Err(err) => Err(err.into()),
        }
    }

    /// Applies a sparse update to the record under `target`.
    ///
    /// # Errors
    /// - `NotFound` when `target` is not stored; nothing is merged or
    ///   written in that case.
    /// - `ValidationFailed` when the patch or the merged record is invalid.
    /// - `BusinessRuleViolation` when the merged birth date is too recent.
    pub async fn update(&self, target: &str, patch: PersonPatch) -> ServiceResult<Person> {
        let started_at = Instant::now();
        let result = self.update_inner(target, patch).await;
        log_outcome("person_update", started_at, &result);
        result
    }

    async fn update_inner(&self, target: &str, patch: PersonPatch) -> ServiceResult<Person> {
        let existing = self.find(target).await?;

        let today = self.clock.today();
        let changes = patch.validate(today)?;
        let candidate = merge(&existing, &changes);
        validate_person(&candidate, today)?;
        self.ensure_eligible(candidate.birth_date, today)?;

        Ok(self.store.upsert(&candidate).await?)
    }

    /// Deletes the record under `target`.
    pub async fn delete(&self, target: &str) -> ServiceResult<()> {
        let started_at = Instant::now();
        let result = self.delete_inner(target).await;
        log_outcome("person_delete", started_at, &result);
        result
    }

    async fn delete_inner(&self, target: &str) -> ServiceResult<()> {
        self.find(target).await?;
        if !self.store.delete(target).await? {
            // Removed concurrently between lookup and delete.
            return Err(ServiceError::NotFound(target.to_string()));
        }
        Ok(())
    }

    /// Returns every record born within `[from, to]`, in store order.
    ///
    /// # Errors
    /// - `BusinessRuleViolation` when `to` precedes `from`; the store is not
    ///   queried.
    /// - `ValidationFailed` when `to` is not in the past.
    pub async fn search_by_birth_date(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ServiceResult<Vec<Person>> {
        let started_at = Instant::now();
        let result = self.search_inner(from, to).await;
        log_outcome("person_search", started_at, &result);
        result
    }

    async fn search_inner(&self, from: NaiveDate, to: NaiveDate) -> ServiceResult<Vec<Person>> {
        if to < from {
            return Err(ServiceError::BusinessRuleViolation(
                MSG_RANGE_ORDER.to_string(),
            ));
        }
        if to >= self.clock.today() {
            return Err(ServiceError::ValidationFailed(ErrorDetail::invalid_content(
                vec![FieldViolation::new("toDate", OBJECT_SEARCH, MSG_PAST_DATE)],
            )));
        }

        Ok(self.store.scan_birth_date_range(from, to).await?)
    }

    fn ensure_eligible(&self, birth_date: NaiveDate, today: NaiveDate) -> ServiceResult<()> {
        if self.policy.is_eligible(birth_date, today) {
            Ok(())
        } else {
            Err(ServiceError::BusinessRuleViolation(
                self.policy.violation_message(),
            ))
        }
    }
}

fn log_outcome<T>(event: &str, started_at: Instant, result: &ServiceResult<T>) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!("event={event} module=service status=ok duration_ms={duration_ms}"),
        Err(ServiceError::StoreUnavailable(err)) => warn!(
            "event={event} module=service status=error duration_ms={duration_ms} error_code=store_unavailable error={err}"
        ),
        Err(err) => info!(
            "event={event} module=service status=rejected duration_ms={duration_ms} error_code={}",
            err.code()
        ),
    }
}
