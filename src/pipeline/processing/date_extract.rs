use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// `DD.MM.YYYY` or `DD-MM-YYYY` in ASCII digits; each separator is matched independently.
static FILENAME_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]{2})[.\-]([0-9]{2})[.\-]([0-9]{4})").expect("valid date regex"));

/// Extract the report date embedded in a file name, e.g. `Output_21.11.2025.xlsx`.
///
/// Only the leftmost match is considered. A match that is not a real calendar
/// date (`31.02.2025`) yields `None` rather than an error.
pub fn extract_date(filename: &str) -> Option<NaiveDate> {
    let caps = FILENAME_DATE.captures(filename)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
