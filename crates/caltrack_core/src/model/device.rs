//! Device record, its closed column set and the fixed date format.
//!
//! # Responsibility
//! - Define the six-field record shared by storage, exchange and reminders.
//! - Own the single date format used across the crate.
//!
//! # Invariants
//! - `DeviceField::ALL` lists columns in schema order; tabular export and the
//!   `CREATE TABLE` statement both follow it.
//! - Dates stay textual at rest; `parse_cal_date` is the only parser.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// `MM/DD/YYYY`, the stored and exchanged date representation.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// Date text that does not parse under [`DATE_FORMAT`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateError {
    pub value: String,
}

impl Display for DateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid date `{}`; expected MM/DD/YYYY", self.value)
    }
}

impl Error for DateError {}

/// Parses `value` under [`DATE_FORMAT`].
pub fn parse_cal_date(value: &str) -> Result<NaiveDate, DateError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| DateError {
        value: value.to_string(),
    })
}

/// Renders a calendar date in [`DATE_FORMAT`].
pub fn format_cal_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// One physical device under calibration control.
///
/// Field names double as column names and CSV headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub property_number: String,
    pub manufacturer: String,
    pub description: String,
    /// Last calibration, `MM/DD/YYYY`.
    pub cal_date: String,
    /// Next calibration deadline, `MM/DD/YYYY`.
    pub cal_due: String,
    pub custodian_email: String,
}

impl Device {
    pub fn new(
        property_number: impl Into<String>,
        manufacturer: impl Into<String>,
        description: impl Into<String>,
        cal_date: impl Into<String>,
        cal_due: impl Into<String>,
        custodian_email: impl Into<String>,
    ) -> Self {
        Self {
            property_number: property_number.into(),
            manufacturer: manufacturer.into(),
            description: description.into(),
            cal_date: cal_date.into(),
            cal_due: cal_due.into(),
            custodian_email: custodian_email.into(),
        }
    }

    /// Value of one column.
    pub fn field(&self, field: DeviceField) -> &str {
        match field {
            DeviceField::PropertyNumber => &self.property_number,
            DeviceField::Manufacturer => &self.manufacturer,
            DeviceField::Description => &self.description,
            DeviceField::CalDate => &self.cal_date,
            DeviceField::CalDue => &self.cal_due,
            DeviceField::CustodianEmail => &self.custodian_email,
        }
    }

    /// Checks both date columns, reporting the first that fails.
    pub fn validate_dates(&self) -> Result<(), DateError> {
        parse_cal_date(&self.cal_date)?;
        parse_cal_date(&self.cal_due)?;
        Ok(())
    }
}

/// Closed set of device columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceField {
    PropertyNumber,
    Manufacturer,
    Description,
    CalDate,
    CalDue,
    CustodianEmail,
}

impl DeviceField {
    /// Schema order.
    pub const ALL: [DeviceField; 6] = [
        Self::PropertyNumber,
        Self::Manufacturer,
        Self::Description,
        Self::CalDate,
        Self::CalDue,
        Self::CustodianEmail,
    ];

    /// Column name as stored.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PropertyNumber => "property_number",
            Self::Manufacturer => "manufacturer",
            Self::Description => "description",
            Self::CalDate => "cal_date",
            Self::CalDue => "cal_due",
            Self::CustodianEmail => "custodian_email",
        }
    }

    /// Exact canonical column name lookup. Aliases live in the query layer.
    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }

    pub fn is_date(self) -> bool {
        matches!(self, Self::CalDate | Self::CalDue)
    }
}

impl Display for DeviceField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{format_cal_date, parse_cal_date, Device, DeviceField};
    use chrono::NaiveDate;

    #[test]
    fn parses_month_day_year() {
        let date = parse_cal_date("08/21/2023").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2023, 8, 21).unwrap());
        assert_eq!(format_cal_date(date), "08/21/2023");
    }

    #[test]
    fn rejects_out_of_range_and_reordered_dates() {
        assert!(parse_cal_date("13/40/2099").is_err());
        assert!(parse_cal_date("2023-08-21").is_err());
        assert!(parse_cal_date("").is_err());
        let err = parse_cal_date("02/30/2024").unwrap_err();
        assert_eq!(err.value, "02/30/2024");
    }

    #[test]
    fn column_names_round_trip_in_schema_order() {
        let names: Vec<_> = DeviceField::ALL.iter().map(|f| f.as_str()).collect();
        assert_eq!(
            names,
            [
                "property_number",
                "manufacturer",
                "description",
                "cal_date",
                "cal_due",
                "custodian_email"
            ]
        );
        for field in DeviceField::ALL {
            assert_eq!(DeviceField::from_column(field.as_str()), Some(field));
        }
        assert_eq!(DeviceField::from_column("due"), None);
    }

    #[test]
    fn validate_dates_reports_first_bad_column() {
        let device = Device::new("B1", "Fluke", "DMM", "01/01/2023", "99/99/2024", "a@b.c");
        assert_eq!(device.validate_dates().unwrap_err().value, "99/99/2024");
        assert_eq!(device.field(DeviceField::Manufacturer), "Fluke");
    }
}
