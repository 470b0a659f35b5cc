//! In-memory person store.
//!
//! # Responsibility
//! - Provide a process-local `PersonStore` for tests and the `memory`
//!   backend.
//!
//! # Invariants
//! - Every operation takes the map lock once, so each call is atomic.
//! - Range scans return records ordered by key.

use crate::model::person::Person;
use crate::repo::person_repo::{PersonStore, RepoError, RepoResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Person store backed by a `BTreeMap` keyed by email.
#[derive(Debug, Default)]
pub struct InMemoryPersonStore {
    persons: RwLock<BTreeMap<String, Person>>,
}

impl InMemoryPersonStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersonStore for InMemoryPersonStore {
    async fn get(&self, email: &str) -> RepoResult<Option<Person>> {
        Ok(self.persons.read().await.get(email).cloned())
    }

    async fn insert(&self, person: &Person) -> RepoResult<Person> {
        let mut persons = self.persons.write().await;
        if persons.contains_key(&person.email) {
            return Err(RepoError::Duplicate(person.email.clone()));
        }
        persons.insert(person.email.clone(), person.clone());
        Ok(person.clone())
    }

    async fn upsert(&self, person: &Person) -> RepoResult<Person> {
        self.persons
            .write()
            .await
            .insert(person.email.clone(), person.clone());
        Ok(person.clone())
    }

    async fn relocate(&self, from: &str, person: &Person) -> RepoResult<Person> {
        let mut persons = self.persons.write().await;
        if persons.contains_key(&person.email) {
            return Err(RepoError::Duplicate(person.email.clone()));
        }
        if persons.remove(from).is_none() {
            return Err(RepoError::NotFound(from.to_string()));
        }
        persons.insert(person.email.clone(), person.clone());
        Ok(person.clone())
    }

    async fn delete(&self, email: &str) -> RepoResult<bool> {
        Ok(self.persons.write().await.remove(email).is_some())
    }

    async fn scan_birth_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<Person>> {
        Ok(self
            .persons
            .read()
            .await
            .values()
            .filter(|person| person.birth_date >= from && person.birth_date <= to)
            .cloned()
            .collect())
    }
}
