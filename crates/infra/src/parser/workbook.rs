//! Excel workbook reader
//!
//! Loads the first worksheet of an `.xlsx` / `.xls` file into the same
//! string grid the CSV reader produces, so header detection and BAL cells
//! share one code path. Date-formatted cells become `YYYY-MM-DD`.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, DataType, Range, Reader};
use loadplan_domain::{LoadplanError, Result};

/// Read the first worksheet of `bytes` as rows of display strings
pub fn read_rows(bytes: &[u8]) -> Result<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|err| LoadplanError::Parse(format!("unreadable workbook: {err}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadplanError::Parse("workbook has no worksheets".into()))?
        .map_err(|err| LoadplanError::Parse(format!("unreadable worksheet: {err}")))?;
    Ok(grid(&range))
}

/// Rows are anchored at A1 so blank leading rows still count toward the
/// header scan.
fn grid(range: &Range<Data>) -> Vec<Vec<String>> {
    let (first_row, first_col) = range.start().unwrap_or((0, 0));
    let lead = vec![String::new(); first_col as usize];

    let mut rows = vec![Vec::new(); first_row as usize];
    rows.extend(range.rows().map(|row| {
        let mut cells = lead.clone();
        cells.extend(row.iter().map(cell_text));
        cells
    }));
    rows
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(text) | Data::DateTimeIso(text) | Data::DurationIso(text) => text.clone(),
        Data::Int(value) => value.to_string(),
        Data::Float(value) => float_text(*value),
        Data::Bool(value) => value.to_string(),
        Data::DateTime(_) => cell
            .as_date()
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
    }
}

/// Whole numbers print without a fraction (`12`, not `12.0`)
fn float_text(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}
