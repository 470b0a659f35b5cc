//! Minimum-age business rule.
//!
//! # Invariants
//! - Eligibility is a pure function of `(birth_date, today, min_age)`.
//! - A person is eligible only when their age in whole years is strictly
//!   greater than `min_age`.

use chrono::{Datelike, NaiveDate};

/// Age threshold applied to every write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgePolicy {
    min_age: u32,
}

impl AgePolicy {
    pub const DEFAULT_MIN_AGE: u32 = 18;

    pub fn new(min_age: u32) -> Self {
        Self { min_age }
    }

    pub fn min_age(&self) -> u32 {
        self.min_age
    }

    pub fn is_eligible(&self, birth_date: NaiveDate, today: NaiveDate) -> bool {
        full_years_between(birth_date, today) > i64::from(self.min_age)
    }

    /// Message reported when `is_eligible` fails.
    pub fn violation_message(&self) -> String {
        format!("User must be at least {} years old.", self.min_age)
    }
}

impl Default for AgePolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MIN_AGE)
    }
}

/// Whole calendar years from `from` to `to`; negative when `to < from`.
///
/// A year counts only once its anniversary (month and day) is reached, so a
/// 29 February birthday completes a year on 1 March in common years.
pub fn full_years_between(from: NaiveDate, to: NaiveDate) -> i64 {
    if to < from {
        return -full_years_between(to, from);
    }

    let mut years = i64::from(to.year() - from.year());
    if (to.month(), to.day()) < (from.month(), from.day()) {
        years -= 1;
    }
    years
}

#[cfg(test)]
mod tests {
    use super::{full_years_between, AgePolicy};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn years_count_only_after_anniversary() {
        assert_eq!(full_years_between(date(2000, 6, 2), date(2018, 6, 1)), 17);
        assert_eq!(full_years_between(date(2000, 6, 1), date(2018, 6, 1)), 18);
    }

    #[test]
    fn leap_day_birthday_completes_on_first_of_march() {
        assert_eq!(full_years_between(date(2000, 2, 29), date(2019, 2, 28)), 18);
        assert_eq!(full_years_between(date(2000, 2, 29), date(2019, 3, 1)), 19);
    }

    #[test]
    fn future_birth_dates_are_negative() {
        assert_eq!(full_years_between(date(2030, 1, 1), date(2024, 1, 1)), -6);
        assert!(!AgePolicy::default().is_eligible(date(2030, 1, 1), date(2024, 1, 1)));
    }

    #[test]
    fn eligibility_is_strictly_greater_than_min_age() {
        let policy = AgePolicy::new(18);
        let today = date(2024, 5, 10);

        assert!(!policy.is_eligible(date(2007, 5, 10), today));
        assert!(!policy.is_eligible(date(2006, 5, 10), today));
        assert!(policy.is_eligible(date(2005, 5, 10), today));
    }

    #[test]
    fn threshold_is_configurable() {
        let today = date(2024, 5, 10);
        assert!(AgePolicy::new(0).is_eligible(date(2022, 5, 10), today));
        assert!(!AgePolicy::new(65).is_eligible(date(1960, 5, 10), today));
    }

    #[test]
    fn violation_message_names_threshold() {
        assert_eq!(
            AgePolicy::new(21).violation_message(),
            "User must be at least 21 years old."
        );
    }
}
