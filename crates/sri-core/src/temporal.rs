//! # Temporal Types: Body Dates and Fiscal Periods
//!
//! Documents carry plain calendar dates in Ecuador's civil calendar; no time
//! of day and no offset. Two renderings exist and must not be confused:
//!
//! - inside document bodies: `DD/MM/YYYY`
//! - inside the access key: `DDMMYYYY`, no separators
//!
//! [`FiscalPeriod`] is the month a withholding certificate or a monthly
//! summary declares. It renders as `MM/YYYY` in bodies.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// `strftime` pattern for dates inside document bodies.
pub const BODY_DATE_FORMAT: &str = "%d/%m/%Y";

/// `strftime` pattern for the date segment of an access key.
pub const KEY_DATE_FORMAT: &str = "%d%m%Y";

/// Render a date the way document bodies carry it.
pub fn body_date(date: NaiveDate) -> String {
    date.format(BODY_DATE_FORMAT).to_string()
}

/// Parse a `DD/MM/YYYY` body date.
pub fn parse_body_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, BODY_DATE_FORMAT).ok()
}

/// Whole days from `from` to `to`; negative if `to` is earlier.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// A calendar month for periodic declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FiscalPeriod {
    pub year: i32,
    pub month: u32,
}

impl FiscalPeriod {
    /// The period containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Whether the month is a real calendar month.
    pub fn is_valid(&self) -> bool {
        (1..=12).contains(&self.month)
    }

    /// Whether `date` falls inside this period.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// `MM/YYYY`, as withholding certificates declare it.
    pub fn to_wire(&self) -> String {
        format!("{:02}/{:04}", self.month, self.year)
    }

    /// Two-digit month.
    pub fn month_padded(&self) -> String {
        format!("{:02}", self.month)
    }

    /// `YYYYMM`, used in periodic file names.
    pub fn file_suffix(&self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }
}

impl std::fmt::Display for FiscalPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_wire())
    }
}
