//! Cell interpretation rules
//!
//! A BAL ("balance") cell encodes a stage's progress: a date means the stage
//! finished for the whole order, a number is the quantity still open,
//! `INHOUSE` means the stage was done in-house (complete), and an empty cell
//! means nothing happened yet.

use loadplan_domain::utils::dates::{is_null_marker, normalize_date};
use loadplan_domain::StageProgress;
use once_cell::sync::Lazy;
use regex::Regex;

static DATE_CELL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}[/-]\d{1,2}|\d{4}[./-]\d{1,2}[./-]\d{1,2})([ T].*)?$")
        .expect("DATE_CELL should compile - this is a bug")
});

static NUMBER_CELL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?(\d+(\.\d*)?|\.\d+)$").expect("NUMBER_CELL should compile - this is a bug")
});

/// Free-text markers that are neither dates nor quantities
const NON_DATE_MARKERS: [&str; 4] = ["INHOUSE", "HAPPO", "OK", "RACH"];

const AQL_MARKERS: [&str; 6] = ["YES", "Y", "OK", "1", "TRUE", "AQL"];

/// Values found in quantity cells of header, note and filler rows
const NON_QUANTITY_MARKERS: [&str; 9] =
    ["Q.TY", "MRP.QTY", "QTY", "NY", "NO", "N/A", "TBD", "-", "INTERTEK"];

fn has_marker(value: &str) -> bool {
    let upper = value.to_ascii_uppercase();
    NON_DATE_MARKERS.iter().any(|marker| upper.contains(marker))
}

pub fn is_date_cell(value: &str) -> bool {
    let trimmed = value.trim();
    !is_null_marker(trimmed) && !has_marker(trimmed) && DATE_CELL.is_match(trimmed)
}

/// Numeric value of a plain number cell (`"12"`, `"12.0"`, `"-3"`)
pub fn number_cell(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if is_null_marker(trimmed) || !NUMBER_CELL.is_match(trimmed) {
        return None;
    }
    trimmed.parse().ok()
}

/// Outcome of reading a quantity cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityCell {
    /// Positive whole quantity
    Valid(u64),
    /// Empty cell or a filler marker; the row is not an order
    Blank,
    /// Something else (zero, negative, text)
    Invalid,
}

pub fn quantity_cell(value: &str) -> QuantityCell {
    let trimmed = value.trim();
    if is_null_marker(trimmed)
        || NON_QUANTITY_MARKERS.iter().any(|marker| trimmed.eq_ignore_ascii_case(marker))
    {
        return QuantityCell::Blank;
    }
    match number_cell(trimmed) {
        Some(qty) if qty >= 1.0 => QuantityCell::Valid(qty.trunc() as u64),
        _ => QuantityCell::Invalid,
    }
}

/// Progress of one stage from its BAL cell
pub fn balance_cell(value: &str, quantity: u64) -> StageProgress {
    let trimmed = value.trim();
    if is_null_marker(trimmed) {
        return StageProgress::pending_all(quantity);
    }
    if trimmed.to_ascii_uppercase().contains("INHOUSE") {
        return StageProgress::completed_all(quantity);
    }
    if is_date_cell(trimmed) {
        return StageProgress::completed_all(quantity);
    }
    match number_cell(trimmed) {
        Some(remaining) => {
            let remaining = if remaining <= 0.0 { 0 } else { remaining.trunc() as u64 };
            StageProgress::from_remaining(quantity, remaining)
        }
        None => StageProgress::pending_all(quantity),
    }
}

/// Date cell as `YYYY-MM-DD`; unrecognised text is kept verbatim, null
/// markers become empty.
pub fn date_or_raw(value: &str, base_year: i32) -> String {
    let trimmed = value.trim();
    if is_null_marker(trimmed) {
        return String::new();
    }
    if is_date_cell(trimmed) {
        if let Some(date) = normalize_date(trimmed, base_year) {
            return date;
        }
    }
    trimmed.to_string()
}

pub fn optional_date(value: &str, base_year: i32) -> Option<String> {
    is_date_cell(value).then(|| normalize_date(value, base_year)).flatten()
}

pub fn aql_cell(value: &str) -> bool {
    let upper = value.trim().to_ascii_uppercase();
    AQL_MARKERS.contains(&upper.as_str())
}

/// Approval marker; `-` and null markers mean none
pub fn code04_cell(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!is_null_marker(trimmed) && trimmed != "-").then(|| trimmed.to_string())
}
