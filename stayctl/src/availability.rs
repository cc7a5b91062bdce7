//! Date-range logic for the availability engine.
//!
//! A stay is a half-open interval `[check_in, check_out)`: the check-in day is
//! occupied, the check-out day is not. Two stays conflict iff
//! `a.check_in < b.check_out && a.check_out > b.check_in`, which makes
//! same-day turnover (checkout on day D, new check-in on day D) legal.
//!
//! Everything in this module is pure; the matching SQL predicate lives in
//! [`crate::db::handlers::rooms`] and the `bookings_confirmed_no_overlap`
//! exclusion constraint mirrors it at the database level.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A half-open `[check_in, check_out)` date interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StayRange {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl StayRange {
    /// Build a range without sanity checks. Callers that accept user input go
    /// through [`AvailabilityQuery::validate`] instead.
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Self {
        Self { check_in, check_out }
    }

    /// Half-open interval overlap.
    pub fn overlaps(&self, other: &StayRange) -> bool {
        self.check_in < other.check_out && self.check_out > other.check_in
    }

    /// Number of nights in the stay. Zero or negative for degenerate ranges.
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Total price for the stay at the given nightly rate.
    pub fn total_price(&self, nightly_rate: Decimal) -> Decimal {
        nightly_rate * Decimal::from(self.nights())
    }
}

/// A guest's availability search: date range plus party size.
///
/// All three fields travel together; [`AvailabilityQuery::validate`] checks
/// them as a group and reports every violated rule at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityQuery {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub num_guests: i32,
}

impl AvailabilityQuery {
    /// Validate the query against `today`, collecting all violations rather
    /// than failing on the first.
    pub fn validate(&self, today: NaiveDate) -> Result<StayRange, Vec<String>> {
        let mut errors = Vec::new();

        if self.check_in < today {
            errors.push("Check-in can not be a past date".to_string());
        }
        if self.check_in == self.check_out {
            errors.push("Check-out must be minimum 1 day after check-in".to_string());
        }
        if self.check_in > self.check_out {
            errors.push("Check-out must be after check-in".to_string());
        }
        if self.num_guests < 1 {
            errors.push("There must be minimum 1 guest".to_string());
        }

        if errors.is_empty() {
            Ok(StayRange::new(self.check_in, self.check_out))
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn range(check_in: &str, check_out: &str) -> StayRange {
        StayRange::new(date(check_in), date(check_out))
    }

    #[test]
    fn overlapping_ranges_conflict() {
        let existing = range("2024-03-01", "2024-03-05");
        assert!(existing.overlaps(&range("2024-03-03", "2024-03-07")));
        assert!(existing.overlaps(&range("2024-02-28", "2024-03-02")));
        assert!(existing.overlaps(&range("2024-03-02", "2024-03-04")));
        assert!(existing.overlaps(&range("2024-02-01", "2024-04-01")));
    }

    #[test]
    fn back_to_back_turnover_is_allowed() {
        let existing = range("2024-01-05", "2024-01-10");
        // New check-in on the existing checkout day, and vice versa.
        assert!(!existing.overlaps(&range("2024-01-10", "2024-01-12")));
        assert!(!existing.overlaps(&range("2024-01-01", "2024-01-05")));
    }

    #[test]
    fn disjoint_ranges_do_not_conflict() {
        let existing = range("2024-01-05", "2024-01-10");
        assert!(!existing.overlaps(&range("2024-01-11", "2024-01-15")));
        assert!(!existing.overlaps(&range("2024-01-01", "2024-01-03")));
    }

    #[test]
    fn overlap_is_symmetric() {
        let a = range("2024-03-01", "2024-03-05");
        let b = range("2024-03-03", "2024-03-07");
        assert_eq!(a.overlaps(&b), b.overlaps(&a));
    }

    #[test]
    fn nights_and_total_price() {
        let stay = range("2024-03-01", "2024-03-05");
        assert_eq!(stay.nights(), 4);
        assert_eq!(stay.total_price(Decimal::new(9950, 2)), Decimal::new(39800, 2));
    }

    #[test]
    fn valid_query_passes() {
        let today = date("2024-02-01");
        let query = AvailabilityQuery {
            check_in: date("2024-03-01"),
            check_out: date("2024-03-05"),
            num_guests: 2,
        };
        assert_eq!(query.validate(today).unwrap(), range("2024-03-01", "2024-03-05"));
    }

    #[test]
    fn same_day_stay_is_rejected() {
        let today = date("2024-02-01");
        let query = AvailabilityQuery {
            check_in: date("2024-03-01"),
            check_out: date("2024-03-01"),
            num_guests: 2,
        };
        let errors = query.validate(today).unwrap_err();
        assert_eq!(errors, vec!["Check-out must be minimum 1 day after check-in".to_string()]);
    }

    #[test]
    fn all_violations_are_reported_together() {
        let today = date("2024-02-01");
        // Past check-in, reversed range, zero guests: three violations at once.
        let query = AvailabilityQuery {
            check_in: date("2024-01-10"),
            check_out: date("2024-01-05"),
            num_guests: 0,
        };
        let errors = query.validate(today).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("past")));
        assert!(errors.iter().any(|e| e.contains("after check-in")));
        assert!(errors.iter().any(|e| e.contains("minimum 1 guest")));
    }

    #[test]
    fn check_in_today_is_accepted() {
        let today = date("2024-02-01");
        let query = AvailabilityQuery {
            check_in: today,
            check_out: date("2024-02-03"),
            num_guests: 1,
        };
        assert!(query.validate(today).is_ok());
    }
}
