//! Structural validation for person records, drafts and patches.
//!
//! # Responsibility
//! - Check field formats (non-blank names, email shape, past birth date,
//!   10-digit phone number).
//! - Report violations as an `ErrorDetail` with one entry per failed field.
//!
//! # Invariants
//! - Checks never short-circuit: every violated field is reported.
//! - Violation messages are stable wire strings.

use crate::model::person::{Person, PersonDraft};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt::{Display, Formatter};

pub const MSG_NOT_BLANK: &str = "must not be blank";
pub const MSG_NOT_NULL: &str = "must not be null";
pub const MSG_PAST_DATE: &str = "must be a past date";
pub const MSG_EMAIL: &str = "must be a well-formed email address";
pub const MSG_PHONE: &str = "Phone number must be 10 digits";
pub const MSG_INVALID_CONTENT: &str = "Invalid request content.";

/// Object name reported for full records and drafts.
pub const OBJECT_PERSON: &str = "person";
/// Object name reported for sparse patches.
pub const OBJECT_PATCH: &str = "personPatch";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    )
    .expect("valid email regex")
});
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{10}$").expect("valid phone regex"));

/// One failed field constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldViolation {
    pub field: String,
    pub object_name: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(
        field: impl Into<String>,
        object_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            object_name: object_name.into(),
            message: message.into(),
        }
    }
}

/// Structured validation report: a summary message plus field violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub violations: Vec<FieldViolation>,
}

impl ErrorDetail {
    pub fn new(message: impl Into<String>, violations: Vec<FieldViolation>) -> Self {
        Self {
            message: message.into(),
            violations,
        }
    }

    /// Report for request bodies that failed field checks.
    pub fn invalid_content(violations: Vec<FieldViolation>) -> Self {
        Self::new(MSG_INVALID_CONTENT, violations)
    }

    /// Returns whether `field` has at least one violation.
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|item| item.field == field)
    }
}

impl Display for ErrorDetail {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        for violation in &self.violations {
            write!(f, "; {}: {}", violation.field, violation.message)?;
        }
        Ok(())
    }
}

/// Validates a complete record as it would be persisted.
pub fn validate_person(person: &Person, today: NaiveDate) -> Result<(), ErrorDetail> {
    let mut violations = Vec::new();
    check_email(Some(person.email.as_str()), OBJECT_PERSON, &mut violations);
    check_not_blank(
        "firstName",
        Some(person.first_name.as_str()),
        OBJECT_PERSON,
        &mut violations,
    );
    check_not_blank(
        "lastName",
        Some(person.last_name.as_str()),
        OBJECT_PERSON,
        &mut violations,
    );
    check_past_date(
        "birthDate",
        Some(person.birth_date),
        today,
        OBJECT_PERSON,
        &mut violations,
    );
    check_phone_number(person.phone_number.as_deref(), OBJECT_PERSON, &mut violations);

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ErrorDetail::invalid_content(violations))
    }
}

/// Collects every violation of a wire draft, including missing fields.
pub fn check_draft(draft: &PersonDraft, today: NaiveDate) -> Vec<FieldViolation> {
    let mut violations = Vec::new();
    check_email(draft.email.as_deref(), OBJECT_PERSON, &mut violations);
    check_not_blank(
        "firstName",
        draft.first_name.as_deref(),
        OBJECT_PERSON,
        &mut violations,
    );
    check_not_blank(
        "lastName",
        draft.last_name.as_deref(),
        OBJECT_PERSON,
        &mut violations,
    );
    check_past_date(
        "birthDate",
        draft.birth_date,
        today,
        OBJECT_PERSON,
        &mut violations,
    );
    check_phone_number(draft.phone_number.as_deref(), OBJECT_PERSON, &mut violations);
    violations
}

pub(crate) fn check_email(value: Option<&str>, object: &str, out: &mut Vec<FieldViolation>) {
    match value {
        Some(email) if !email.trim().is_empty() => {
            if !EMAIL_RE.is_match(email) {
                out.push(FieldViolation::new("email", object, MSG_EMAIL));
            }
        }
        _ => out.push(FieldViolation::new("email", object, MSG_NOT_BLANK)),
    }
}

pub(crate) fn check_not_blank(
    field: &str,
    value: Option<&str>,
    object: &str,
    out: &mut Vec<FieldViolation>,
) {
    if value.map_or(true, |text| text.trim().is_empty()) {
        out.push(FieldViolation::new(field, object, MSG_NOT_BLANK));
    }
}

pub(crate) fn check_past_date(
    field: &str,
    value: Option<NaiveDate>,
    today: NaiveDate,
    object: &str,
    out: &mut Vec<FieldViolation>,
) {
    match value {
        Some(date) if date >= today => {
            out.push(FieldViolation::new(field, object, MSG_PAST_DATE));
        }
        Some(_) => {}
        None => out.push(FieldViolation::new(field, object, MSG_NOT_NULL)),
    }
}

pub(crate) fn check_phone_number(value: Option<&str>, object: &str, out: &mut Vec<FieldViolation>) {
    if let Some(phone) = value {
        if !PHONE_RE.is_match(phone) {
            out.push(FieldViolation::new("phoneNumber", object, MSG_PHONE));
        }
    }
}
