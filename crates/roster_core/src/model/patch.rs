//! Sparse partial-update descriptors and the per-field merger.
//!
//! # Responsibility
//! - Model tri-state field updates (`Absent`, `Null`, `Value`).
//! - Validate wire patches into `PersonChanges`, where required fields can
//!   no longer express "clear".
//! - Merge changes onto an existing record without touching absent fields.
//!
//! # Invariants
//! - `merge` is pure and total; it never mutates the record it reads.
//! - Identity (`email`) is not part of any descriptor.

use crate::model::person::{wire_date, Person};
use crate::model::validation::{
    self, ErrorDetail, FieldViolation, MSG_NOT_BLANK, MSG_NOT_NULL, OBJECT_PATCH,
};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

/// One field of a sparse update.
///
/// Deserializes `null` as `Null` and any value as `Value`; a missing field
/// becomes `Absent` through `#[serde(default)]` on the containing struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    /// Leave the field unchanged.
    Absent,
    /// Clear the field.
    Null,
    /// Overwrite the field.
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Resolves an optional field against its current value.
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Self::Absent => current,
            Self::Null => None,
            Self::Value(value) => Some(value),
        }
    }
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(value) => Self::Value(value),
            None => Self::Null,
        })
    }
}

fn deserialize_date_patch<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Patch<NaiveDate>, D::Error> {
    wire_date::option::deserialize(deserializer).map(|value| match value {
        Some(date) => Patch::Value(date),
        None => Patch::Null,
    })
}

/// Wire descriptor for `PATCH` requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonPatch {
    #[serde(default)]
    pub first_name: Patch<String>,
    #[serde(default)]
    pub last_name: Patch<String>,
    #[serde(default, deserialize_with = "deserialize_date_patch")]
    pub birth_date: Patch<NaiveDate>,
    #[serde(default)]
    pub address: Patch<String>,
    #[serde(default)]
    pub phone_number: Patch<String>,
}

impl PersonPatch {
    /// Returns whether no field is present.
    pub fn is_empty(&self) -> bool {
        self.first_name.is_absent()
            && self.last_name.is_absent()
            && self.birth_date.is_absent()
            && self.address.is_absent()
            && self.phone_number.is_absent()
    }

    /// Checks every present field and narrows required fields to two states.
    ///
    /// # Errors
    /// - `Null` on `firstName`, `lastName` or `birthDate`.
    /// - Present values that break the record's field constraints.
    pub fn validate(self, today: NaiveDate) -> Result<PersonChanges, ErrorDetail> {
        let mut violations = Vec::new();

        let first_name = required_text("firstName", self.first_name, &mut violations);
        let last_name = required_text("lastName", self.last_name, &mut violations);
        let birth_date = match self.birth_date {
            Patch::Absent => None,
            Patch::Null => {
                violations.push(FieldViolation::new("birthDate", OBJECT_PATCH, MSG_NOT_NULL));
                None
            }
            Patch::Value(date) => {
                validation::check_past_date(
                    "birthDate",
                    Some(date),
                    today,
                    OBJECT_PATCH,
                    &mut violations,
                );
                Some(date)
            }
        };
        if let Patch::Value(phone) = &self.phone_number {
            validation::check_phone_number(Some(phone.as_str()), OBJECT_PATCH, &mut violations);
        }

        if !violations.is_empty() {
            return Err(ErrorDetail::invalid_content(violations));
        }

        Ok(PersonChanges {
            first_name,
            last_name,
            birth_date,
            address: self.address,
            phone_number: self.phone_number,
        })
    }
}

fn required_text(
    field: &str,
    value: Patch<String>,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    match value {
        Patch::Absent => None,
        Patch::Null => {
            violations.push(FieldViolation::new(field, OBJECT_PATCH, MSG_NOT_BLANK));
            None
        }
        Patch::Value(text) => {
            validation::check_not_blank(field, Some(text.as_str()), OBJECT_PATCH, violations);
            Some(text)
        }
    }
}

/// Validated sparse update.
///
/// Required fields are `Option` (keep or replace); optional fields keep
/// the full tri-state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Patch<String>,
    pub phone_number: Patch<String>,
}

/// Applies `changes` onto a copy of `existing`.
pub fn merge(existing: &Person, changes: &PersonChanges) -> Person {
    let mut merged = existing.clone();
    if let Some(first_name) = &changes.first_name {
        merged.first_name = first_name.clone();
    }
    if let Some(last_name) = &changes.last_name {
        merged.last_name = last_name.clone();
    }
    if let Some(birth_date) = changes.birth_date {
        merged.birth_date = birth_date;
    }
    merged.address = changes.address.clone().apply(merged.address);
    merged.phone_number = changes.phone_number.clone().apply(merged.phone_number);
    merged
}
