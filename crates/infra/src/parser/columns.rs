//! Header detection and the column alias table
//!
//! Factory exports place columns at different offsets, so columns are found
//! by header text. Header cells are normalised to uppercase alphanumerics
//! (`"Q.ty"` → `QTY`, `"S/CUT BAL"` → `SCUTBAL`) before lookup.

use std::collections::HashMap;

use loadplan_domain::Stage;

/// Columns the parser understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Unit,
    Season,
    Crd,
    SddOriginal,
    SddCurrent,
    Code04,
    Model,
    Article,
    Color,
    Destination,
    Quantity,
    PoNumber,
    Vendor,
    Aql,
    Inspection,
    Balance(Stage),
}

const ALIASES: &[(&str, Column)] = &[
    ("UNIT", Column::Unit),
    ("SEASON", Column::Season),
    ("CRD", Column::Crd),
    ("SDDORIGINAL", Column::SddOriginal),
    ("ORIGINALSDD", Column::SddOriginal),
    ("SDDORG", Column::SddOriginal),
    ("SDD", Column::SddCurrent),
    ("SDDCURRENT", Column::SddCurrent),
    ("CURRENTSDD", Column::SddCurrent),
    ("CODE04", Column::Code04),
    ("CODE4", Column::Code04),
    ("MODEL", Column::Model),
    ("MODELNAME", Column::Model),
    ("ARTICLE", Column::Article),
    ("ART", Column::Article),
    ("COLOR", Column::Color),
    ("COLOUR", Column::Color),
    ("DEST", Column::Destination),
    ("DESTINATION", Column::Destination),
    ("COUNTRY", Column::Destination),
    ("QTY", Column::Quantity),
    ("QUANTITY", Column::Quantity),
    ("PO", Column::PoNumber),
    ("PONO", Column::PoNumber),
    ("PONUMBER", Column::PoNumber),
    ("SETP", Column::PoNumber),
    ("OUTSOLEVENDOR", Column::Vendor),
    ("OSVENDOR", Column::Vendor),
    ("VENDOR", Column::Vendor),
    ("INTERTEK", Column::Aql),
    ("AQL", Column::Aql),
    ("INSPECTION", Column::Inspection),
    ("SCUT", Column::Balance(Stage::SCut)),
    ("SCUTBAL", Column::Balance(Stage::SCut)),
    ("PRESEW", Column::Balance(Stage::PreSew)),
    ("PRESEWBAL", Column::Balance(Stage::PreSew)),
    ("SEWINPUT", Column::Balance(Stage::SewInput)),
    ("SEWINPUTBAL", Column::Balance(Stage::SewInput)),
    ("SEWBAL", Column::Balance(Stage::SewBal)),
    ("SFIT", Column::Balance(Stage::SFit)),
    ("SFITBAL", Column::Balance(Stage::SFit)),
    ("ASSBAL", Column::Balance(Stage::AssBal)),
    ("WHIN", Column::Balance(Stage::WhIn)),
    ("WHINBAL", Column::Balance(Stage::WhIn)),
    ("WHOUT", Column::Balance(Stage::WhOut)),
    ("WHOUTBAL", Column::Balance(Stage::WhOut)),
];

/// Header rows must name at least this many known columns
const MIN_HEADER_MATCHES: usize = 3;

/// How far down the sheet to look for the header row
pub const HEADER_SCAN_ROWS: usize = 20;

fn normalize_header(cell: &str) -> String {
    cell.chars().filter(char::is_ascii_alphanumeric).map(|c| c.to_ascii_uppercase()).collect()
}

/// Known column named by a header cell, if any
pub fn lookup(cell: &str) -> Option<Column> {
    let key = normalize_header(cell);
    if key.is_empty() {
        return None;
    }
    ALIASES.iter().find(|(alias, _)| *alias == key).map(|(_, column)| *column)
}

/// Column positions resolved from a header row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    positions: HashMap<Column, usize>,
}

impl ColumnMap {
    /// Resolve a header row. The first occurrence of a column wins.
    pub fn from_header(row: &[String]) -> Self {
        let mut positions = HashMap::new();
        for (idx, cell) in row.iter().enumerate() {
            if let Some(column) = lookup(cell) {
                positions.entry(column).or_insert(idx);
            }
        }
        Self { positions }
    }

    /// Whether the row looks like a header: enough known columns, one of
    /// them the quantity column.
    pub fn is_header(row: &[String]) -> bool {
        let map = Self::from_header(row);
        map.contains(Column::Quantity) && map.len() >= MIN_HEADER_MATCHES
    }

    pub fn position(&self, column: Column) -> Option<usize> {
        self.positions.get(&column).copied()
    }

    pub fn contains(&self, column: Column) -> bool {
        self.positions.contains_key(&column)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Trimmed cell for `column`; missing columns and short rows read as ""
    pub fn cell<'r>(&self, row: &'r [String], column: Column) -> &'r str {
        self.position(column).and_then(|idx| row.get(idx)).map_or("", |cell| cell.trim())
    }
}

/// Index of the first header row within the scan window
pub fn find_header(rows: &[Vec<String>]) -> Option<usize> {
    rows.iter().take(HEADER_SCAN_ROWS).position(|row| ColumnMap::is_header(row))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| (*c).to_string()).collect()
    }

    #[test]
    fn aliases_ignore_case_and_punctuation() {
        assert_eq!(lookup("Q.ty"), Some(Column::Quantity));
        assert_eq!(lookup(" s/cut bal "), Some(Column::Balance(Stage::SCut)));
        assert_eq!(lookup("W.H OUT BAL"), Some(Column::Balance(Stage::WhOut)));
        assert_eq!(lookup("Outsole Vendor"), Some(Column::Vendor));
        assert_eq!(lookup("MRP.Qty"), None);
        assert_eq!(lookup(""), None);
    }

    #[test]
    fn first_occurrence_wins() {
        let map = ColumnMap::from_header(&row(&["PO", "Qty", "Model", "Qty"]));
        assert_eq!(map.position(Column::Quantity), Some(1));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn header_is_found_below_title_rows() {
        let rows = vec![
            row(&["LOADPLAN ASSEMBLY", "", ""]),
            row(&["", "", ""]),
            row(&["Unit", "Model", "Dest", "Q.ty"]),
            row(&["U1", "M1", "Germany", "100"]),
        ];
        assert_eq!(find_header(&rows), Some(2));
        assert!(!ColumnMap::is_header(&rows[3]));
    }

    #[test]
    fn cell_reads_missing_as_empty() {
        let map = ColumnMap::from_header(&row(&["Model", "Qty", "Dest"]));
        let data = row(&[" M1 ", "10"]);
        assert_eq!(map.cell(&data, Column::Model), "M1");
        assert_eq!(map.cell(&data, Column::Destination), "");
        assert_eq!(map.cell(&data, Column::Crd), "");
    }
}
