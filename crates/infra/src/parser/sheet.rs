//! Row-to-record conversion for tabular loadplan exports

use loadplan_domain::constants::{NULL_TIME_PLACEHOLDER, UNKNOWN_DESTINATION};
use loadplan_domain::utils::dates::is_null_marker;
use loadplan_domain::{
    Factory, LoadplanError, OrderRecord, ParseStatistics, ParsedFile, Production, Result, Stage,
    StageProgress,
};
use tracing::debug;

use super::cells::{
    aql_cell, balance_cell, code04_cell, date_or_raw, optional_date, quantity_cell, QuantityCell,
};
use super::columns::{find_header, Column, ColumnMap, HEADER_SCAN_ROWS};

/// Columns without which no row can become a record
const REQUIRED: [Column; 2] = [Column::Quantity, Column::Model];

/// Convert parsed rows into order records
pub fn records_from_rows(
    rows: &[Vec<String>],
    factory: Factory,
    base_year: i32,
) -> Result<ParsedFile> {
    let header_idx = find_header(rows).ok_or_else(|| {
        LoadplanError::Parse(format!("no header row in the first {HEADER_SCAN_ROWS} rows"))
    })?;
    let columns = ColumnMap::from_header(&rows[header_idx]);
    if let Some(missing) = REQUIRED.iter().find(|column| !columns.contains(**column)) {
        return Err(LoadplanError::Parse(format!("header is missing the {missing:?} column")));
    }

    let mut statistics = ParseStatistics::default();
    let mut orders = Vec::new();

    for row in &rows[header_idx + 1..] {
        statistics.rows_read += 1;

        if row.iter().all(|cell| cell.trim().is_empty()) || ColumnMap::is_header(row) {
            statistics.skipped_rows += 1;
            continue;
        }

        let quantity = match quantity_cell(columns.cell(row, Column::Quantity)) {
            QuantityCell::Valid(quantity) => quantity,
            QuantityCell::Blank => {
                statistics.skipped_rows += 1;
                continue;
            }
            QuantityCell::Invalid => {
                statistics.error_rows += 1;
                continue;
            }
        };

        // Total and subtotal rows carry a quantity but no unit or model.
        let unit = columns.cell(row, Column::Unit);
        let model = columns.cell(row, Column::Model);
        if unit.is_empty() && model.is_empty() {
            statistics.skipped_rows += 1;
            continue;
        }

        orders.push(build_record(row, &columns, factory, quantity, base_year, &mut statistics));
    }

    statistics.records = orders.len() as u64;
    debug!(
        header_row = header_idx,
        records = statistics.records,
        skipped = statistics.skipped_rows,
        errors = statistics.error_rows,
        "rows converted"
    );
    Ok(ParsedFile { orders, statistics })
}

fn text(columns: &ColumnMap, row: &[String], column: Column) -> String {
    let value = columns.cell(row, column);
    if is_null_marker(value) {
        String::new()
    } else {
        value.to_string()
    }
}

fn build_record(
    row: &[String],
    columns: &ColumnMap,
    factory: Factory,
    quantity: u64,
    base_year: i32,
    statistics: &mut ParseStatistics,
) -> OrderRecord {
    let mut destination = text(columns, row, Column::Destination);
    if destination.is_empty() {
        destination = UNKNOWN_DESTINATION.to_string();
        statistics.empty_destinations += 1;
    }

    let mut date_cell = |column: Column| {
        let raw = columns.cell(row, column);
        if raw == NULL_TIME_PLACEHOLDER {
            statistics.invalid_dates += 1;
        }
        date_or_raw(raw, base_year)
    };
    let crd = date_cell(Column::Crd);
    let sdd_current = date_cell(Column::SddCurrent);
    let sdd_original = date_cell(Column::SddOriginal);
    let sdd_value = if sdd_current.is_empty() { sdd_original } else { sdd_current };

    let mut production = Production::new();
    for stage in Stage::ALL {
        let column = Column::Balance(stage);
        let progress = if columns.contains(column) {
            balance_cell(columns.cell(row, column), quantity)
        } else {
            StageProgress::pending_all(quantity)
        };
        production.insert(stage, progress);
    }

    OrderRecord {
        po_number: text(columns, row, Column::PoNumber),
        factory,
        model: text(columns, row, Column::Model),
        article: text(columns, row, Column::Article),
        destination,
        vendor: text(columns, row, Column::Vendor),
        quantity,
        crd,
        sdd_value,
        code04: code04_cell(columns.cell(row, Column::Code04)),
        production,
        unit: text(columns, row, Column::Unit),
        season: text(columns, row, Column::Season),
        color: text(columns, row, Column::Color),
        aql: aql_cell(columns.cell(row, Column::Aql)),
        inspection: optional_date(columns.cell(row, Column::Inspection), base_year),
    }
}
