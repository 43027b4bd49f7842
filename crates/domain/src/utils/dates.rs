//! Loadplan date string helpers
//!
//! Dates travel as strings (`YYYY-MM-DD`, `YYYY.MM.DD`, `YYYY/MM/DD`, with an
//! optional time suffix). Spreadsheet exports also contain bare `MM/DD`
//! cells and placeholder values, which [`normalize_date`] resolves.

use chrono::{Datelike, Duration, NaiveDate};

use crate::constants::NULL_TIME_PLACEHOLDER;

const FULL_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d"];

/// Month from which bare `MM/DD` cells belong to the base year; earlier
/// months roll into the following year.
pub const SEASON_PIVOT_MONTH: u32 = 10;

/// Placeholder or empty cell
pub fn is_null_marker(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed == NULL_TIME_PLACEHOLDER
        || trimmed == "#N/A"
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed == "None"
}

/// Parse a full date, ignoring any time suffix
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    if is_null_marker(value) {
        return None;
    }
    let date_part = value.trim().split(['T', ' ']).next().unwrap_or_default();
    FULL_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
}

/// `YYYY-MM` of a parseable date
pub fn year_month(value: &str) -> Option<String> {
    parse_date(value).map(|date| date.format("%Y-%m").to_string())
}

/// Parse a bare `MM/DD` or `MM-DD` cell using the season pivot
pub fn parse_month_day(value: &str, base_year: i32) -> Option<NaiveDate> {
    let (month, day) = value.trim().split_once(['/', '-'])?;
    if month.len() > 2 || day.len() > 2 {
        return None;
    }
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    let year = if month >= SEASON_PIVOT_MONTH { base_year } else { base_year + 1 };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Canonical `YYYY-MM-DD` for any recognised date cell
pub fn normalize_date(value: &str, base_year: i32) -> Option<String> {
    parse_date(value)
        .or_else(|| parse_month_day(value, base_year))
        .map(|date| date.format("%Y-%m-%d").to_string())
}

/// Sunday through Saturday of the week containing `today`
pub fn week_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = i64::from(today.weekday().num_days_from_sunday());
    let start = today - Duration::days(offset);
    (start, start + Duration::days(6))
}
