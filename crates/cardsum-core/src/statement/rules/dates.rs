//! Day/month/year date parsing for statement text.

use chrono::NaiveDate;

use crate::error::ExtractionError;

/// Parse `DD/MM/YY`, `DD/MM/YYYY` (also `-` or `.` separated).
pub fn parse_statement_date(raw: &str) -> Result<NaiveDate, ExtractionError> {
    let invalid = || ExtractionError::InvalidDate {
        raw: raw.to_string(),
    };

    let mut parts = raw.trim().split(['/', '-', '.']);
    let day: u32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    let month: u32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    let year = parts.next().and_then(parse_year).ok_or_else(invalid)?;
    if parts.next().is_some() {
        return Err(invalid());
    }

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Format a date the way statements print it.
pub fn format_statement_date(date: &NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    match s.len() {
        // Two-digit year: assume 2000s for 00-50, 1900s for 51-99
        2 if year <= 50 => Some(2000 + year),
        2 => Some(1900 + year),
        4 => Some(year),
        _ => None,
    }
}
