//! # Age Calculator
//!
//! Converts a birthdate into whole elapsed months. The result feeds the
//! template eligibility query, so it never fails: a missing, malformed or
//! future birthdate yields 0 instead of an error.
//!
//! A month is complete once its day-of-month has been reached. Month ends
//! clamp the way `chrono` adds months, so a child born on Jan 31 turns one
//! month old on the last day of February.

use chrono::{DateTime, Datelike, Months, NaiveDate};
use log::warn;

/// Whole months between `birthdate` and `today`
pub fn age_in_months(birthdate: Option<NaiveDate>, today: NaiveDate) -> u32 {
    let Some(birthdate) = birthdate else {
        return 0;
    };
    if birthdate >= today {
        return 0;
    }

    let year_months = (today.year() - birthdate.year()) * 12;
    let month_delta = today.month() as i32 - birthdate.month() as i32;
    let mut months = (year_months + month_delta).max(0) as u32;

    // The day-of-month (after clamping) may not have been reached yet
    while months > 0 {
        match birthdate.checked_add_months(Months::new(months)) {
            Some(anniversary) if anniversary <= today => break,
            _ => months -= 1,
        }
    }
    months
}

/// Same as [`age_in_months`] for a stored birthdate string
pub fn age_in_months_from_str(birthdate: &str, today: NaiveDate) -> u32 {
    let parsed = parse_birthdate(birthdate);
    if parsed.is_none() && !birthdate.trim().is_empty() {
        warn!("Unreadable birthdate '{}', treating age as 0 months", birthdate);
    }
    age_in_months(parsed, today)
}

/// Accepts a plain `YYYY-MM-DD` date or an RFC 3339 timestamp
pub fn parse_birthdate(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|t| t.date_naive()))
}

/// Display form used on the milestone page, e.g. "1 years, 3 months"
pub fn format_age(months: u32) -> String {
    format!("{} years, {} months", months / 12, months % 12)
}
