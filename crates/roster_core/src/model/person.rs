//! Person domain model.
//!
//! # Responsibility
//! - Define the canonical person record persisted by the record store.
//! - Define the wire draft used by create/full-replace requests.
//!
//! # Invariants
//! - `email` is the storage key and never changes in place; changing it is a
//!   relocation handled by the service layer.
//! - Stored records always pass `validation::validate_person`.
//! - `birthDate` crosses the wire as `dd-MM-yyyy`.

use crate::model::validation::{self, ErrorDetail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identity of a person record (its contact email).
pub type PersonId = String;

/// Canonical person record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// Unique key and contact address.
    pub email: PersonId,
    pub first_name: String,
    pub last_name: String,
    /// Must be strictly before the current date.
    #[serde(with = "wire_date")]
    pub birth_date: NaiveDate,
    pub address: Option<String>,
    /// Exactly 10 ASCII digits when set.
    pub phone_number: Option<String>,
}

impl Person {
    /// Creates a record with required fields only.
    ///
    /// This constructor does not validate; write paths do.
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        birth_date: NaiveDate,
    ) -> Self {
        Self {
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            birth_date,
            address: None,
            phone_number: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = Some(phone_number.into());
        self
    }
}

/// Wire shape of a full person record for create and full replace.
///
/// Every field is optional here so that missing required fields surface as
/// field violations next to every other violation instead of a parse error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonDraft {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, with = "wire_date::option")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

impl PersonDraft {
    /// Validates the draft against `today` and builds the record.
    ///
    /// # Errors
    /// - Returns every field violation found, never only the first one.
    pub fn into_person(self, today: NaiveDate) -> Result<Person, ErrorDetail> {
        let violations = validation::check_draft(&self, today);
        if !violations.is_empty() {
            return Err(ErrorDetail::invalid_content(violations));
        }

        match (self.email, self.first_name, self.last_name, self.birth_date) {
            (Some(email), Some(first_name), Some(last_name), Some(birth_date)) => Ok(Person {
                email,
                first_name,
                last_name,
                birth_date,
                address: self.address,
                phone_number: self.phone_number,
            }),
            // check_draft reports every missing required field above.
            _ => Err(ErrorDetail::invalid_content(Vec::new())),
        }
    }
}

impl From<Person> for PersonDraft {
    fn from(value: Person) -> Self {
        Self {
            email: Some(value.email),
            first_name: Some(value.first_name),
            last_name: Some(value.last_name),
            birth_date: Some(value.birth_date),
            address: value.address,
            phone_number: value.phone_number,
        }
    }
}

/// Serde adapter for the `dd-MM-yyyy` wire date format.
pub mod wire_date {
    use chrono::NaiveDate;
    use once_cell::sync::Lazy;
    use regex::Regex;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%d-%m-%Y";

    static SHAPE_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[0-9]{2}-[0-9]{2}-[0-9]{4}$").expect("valid wire date regex"));

    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    pub enum WireDateError {
        #[error("not in fixed-width dd-MM-yyyy form")]
        Shape,
        #[error(transparent)]
        Calendar(#[from] chrono::ParseError),
    }

    /// Parses one wire date such as `24-08-1991`.
    ///
    /// Only the fixed-width form is accepted: no padding, no single-digit
    /// day or month.
    pub fn parse(value: &str) -> Result<NaiveDate, WireDateError> {
        if !SHAPE_RE.is_match(value) {
            return Err(WireDateError::Shape);
        }
        Ok(NaiveDate::parse_from_str(value, FORMAT)?)
    }

    /// Formats one date in wire form.
    pub fn format(date: NaiveDate) -> String {
        date.format(FORMAT).to_string()
    }

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(|err| {
            serde::de::Error::custom(format!("invalid date `{raw}`, expected dd-MM-yyyy: {err}"))
        })
    }

    /// Same format for nullable fields.
    pub mod option {
        use chrono::NaiveDate;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            date: &Option<NaiveDate>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => serializer.serialize_str(&super::format(*date)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDate>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::parse(&raw).map(Some).map_err(|err| {
                    serde::de::Error::custom(format!(
                        "invalid date `{raw}`, expected dd-MM-yyyy: {err}"
                    ))
                }),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{wire_date, Person, PersonDraft};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn wire_date_parses_day_month_year() {
        assert_eq!(wire_date::parse("24-08-1991").unwrap(), date(1991, 8, 24));
        assert!(wire_date::parse("1991-08-24").is_err());
    }

    #[test]
    fn wire_date_rejects_unpadded_and_padded_input() {
        for raw in ["1-8-1991", "01-8-1991", " 24-08-1991 ", "24-08-1991\n", "24-08-91"] {
            assert_eq!(
                wire_date::parse(raw),
                Err(wire_date::WireDateError::Shape),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn wire_date_rejects_impossible_calendar_dates() {
        assert!(matches!(
            wire_date::parse("31-02-1991"),
            Err(wire_date::WireDateError::Calendar(_))
        ));
    }

    #[test]
    fn draft_rejects_single_digit_birth_date() {
        let result = serde_json::from_value::<PersonDraft>(serde_json::json!({
            "birthDate": "1-8-1991"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn wire_date_formats_with_zero_padding() {
        assert_eq!(wire_date::format(date(2001, 2, 3)), "03-02-2001");
    }

    #[test]
    fn draft_from_person_keeps_every_field() {
        let person = Person::new("a@x.com", "Ann", "Lee", date(1990, 1, 1))
            .with_address("123 Main St")
            .with_phone_number("1234567890");
        let draft = PersonDraft::from(person.clone());

        assert_eq!(draft.into_person(date(2024, 1, 1)).unwrap(), person);
    }
}
