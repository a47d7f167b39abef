//! Expiry arithmetic against a reference date.
//!
//! # Responsibility
//! - Compute signed day deltas between a due date and a reference day.
//! - Classify devices into expiry buckets around the reminder horizon.
//!
//! # Invariants
//! - Every function takes its reference date explicitly; only `today()`
//!   reads the clock.
//! - Overdue devices are always inside the reminder horizon.

use crate::model::device::{parse_cal_date, DateError, Device};
use chrono::{Local, NaiveDate};

/// Day count within which a due date triggers a reminder.
pub const REMINDER_HORIZON_DAYS: i64 = 60;

/// Current local calendar day.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Days from `reference` until `due_date`.
///
/// Positive while valid, zero on the due day, negative once overdue.
pub fn days_until(due_date: &str, reference: NaiveDate) -> Result<i64, DateError> {
    let due = parse_cal_date(due_date)?;
    Ok((due - reference).num_days())
}

/// Whether `due_date` is at most `horizon_days` away from `reference`.
pub fn is_within_reminder_horizon(
    due_date: &str,
    reference: NaiveDate,
    horizon_days: i64,
) -> Result<bool, DateError> {
    Ok(days_until(due_date, reference)? <= horizon_days)
}

/// Expiry bucket of a single due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryStatus {
    Overdue,
    DueToday,
    /// Due within the horizon but not today.
    DueSoon,
    Current,
}

impl ExpiryStatus {
    /// Buckets a precomputed day delta.
    pub fn from_days(days: i64, horizon_days: i64) -> Self {
        match days {
            d if d < 0 => Self::Overdue,
            0 => Self::DueToday,
            d if d <= horizon_days => Self::DueSoon,
            _ => Self::Current,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overdue => "overdue",
            Self::DueToday => "due_today",
            Self::DueSoon => "due_soon",
            Self::Current => "current",
        }
    }
}

/// Classifies `due_date` relative to `reference`.
pub fn classify(
    due_date: &str,
    reference: NaiveDate,
    horizon_days: i64,
) -> Result<ExpiryStatus, DateError> {
    let days = days_until(due_date, reference)?;
    Ok(ExpiryStatus::from_days(days, horizon_days))
}

/// Per-device day delta; a bad due date affects only its own entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryEntry {
    pub property_number: String,
    pub days: Result<i64, DateError>,
}

/// Computes `days_until(cal_due)` for every device, preserving input order.
pub fn expiry_report(devices: &[Device], reference: NaiveDate) -> Vec<ExpiryEntry> {
    devices
        .iter()
        .map(|device| ExpiryEntry {
            property_number: device.property_number.clone(),
            days: days_until(&device.cal_due, reference),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn days_until_is_signed() {
        let reference = day(2023, 8, 21);
        assert_eq!(days_until("08/01/2023", reference).unwrap(), -20);
        assert_eq!(days_until("08/21/2023", reference).unwrap(), 0);
        assert_eq!(days_until("08/22/2023", reference).unwrap(), 1);
        assert_eq!(days_until("01/01/2024", reference).unwrap(), 133);
    }

    #[test]
    fn days_until_rejects_unparseable_dates() {
        let err = days_until("2023/08/01", day(2023, 8, 21)).unwrap_err();
        assert_eq!(err.value, "2023/08/01");
    }

    #[test]
    fn horizon_boundary_is_inclusive_and_overdue_always_qualifies() {
        let reference = day(2024, 1, 1);
        assert!(is_within_reminder_horizon("03/01/2024", reference, 60).unwrap());
        assert!(!is_within_reminder_horizon("03/02/2024", reference, 60).unwrap());
        assert!(is_within_reminder_horizon("01/01/2000", reference, 60).unwrap());
        assert!(is_within_reminder_horizon("01/01/2024", reference, 0).unwrap());
    }

    #[test]
    fn classify_buckets_each_range() {
        let reference = day(2023, 8, 21);
        let horizon = REMINDER_HORIZON_DAYS;
        assert_eq!(classify("08/20/2023", reference, horizon).unwrap(), ExpiryStatus::Overdue);
        assert_eq!(classify("08/21/2023", reference, horizon).unwrap(), ExpiryStatus::DueToday);
        assert_eq!(classify("10/20/2023", reference, horizon).unwrap(), ExpiryStatus::DueSoon);
        assert_eq!(classify("10/21/2023", reference, horizon).unwrap(), ExpiryStatus::Current);
    }

    #[test]
    fn expiry_report_isolates_bad_rows() {
        let devices = vec![
            Device::new("A", "m", "d", "01/01/2023", "08/31/2023", "a@x"),
            Device::new("B", "m", "d", "01/01/2023", "not a date", "b@x"),
        ];
        let report = expiry_report(&devices, day(2023, 8, 21));
        assert_eq!(report[0].days, Ok(10));
        assert!(report[1].days.is_err());
        assert_eq!(report[1].property_number, "B");
    }
}
