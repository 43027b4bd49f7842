//! Loadplan file parser
//!
//! Converts downloaded loadplan files into [`OrderRecord`]s:
//! - `.csv`: header-detected columns (see [`columns`]) with BAL semantics
//!   (see [`cells`])
//! - `.json`: an array of records, or an object with a `records` array
//! - `.xlsx` / `.xls`: the first worksheet (see [`workbook`]), converted
//!   exactly like a CSV grid

pub mod cells;
pub mod columns;
pub mod csv;
pub mod sheet;
pub mod workbook;

use chrono::{Datelike, NaiveDate};
use loadplan_core::sync::FileParser;
use loadplan_domain::constants::UNKNOWN_DESTINATION;
use loadplan_domain::utils::dates::SEASON_PIVOT_MONTH;
use loadplan_domain::{Factory, LoadplanError, OrderRecord, ParseStatistics, ParsedFile, Result};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::errors::InfraError;

/// Year in which the season containing `today` started. Bare `MM/DD` cells
/// from October onwards belong to this year, earlier months to the next.
pub fn season_base_year(today: NaiveDate) -> i32 {
    if today.month() >= SEASON_PIVOT_MONTH {
        today.year()
    } else {
        today.year() - 1
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonPayload {
    Records(Vec<OrderRecord>),
    Wrapped { records: Vec<OrderRecord> },
}

/// Workbook/CSV/JSON loadplan parser
#[derive(Debug, Clone, Copy)]
pub struct LoadplanParser {
    base_year: i32,
}

impl LoadplanParser {
    pub fn new(base_year: i32) -> Self {
        Self { base_year }
    }

    /// Parser for the season containing `today`
    pub fn for_day(today: NaiveDate) -> Self {
        Self::new(season_base_year(today))
    }

    pub fn base_year(&self) -> i32 {
        self.base_year
    }

    fn parse_csv(&self, bytes: &[u8], factory: Factory) -> Result<ParsedFile> {
        let text = std::str::from_utf8(bytes)
            .map_err(|err| LoadplanError::Parse(format!("file is not UTF-8 text: {err}")))?;
        let delimiter = csv::sniff_delimiter(text);
        let rows = csv::read_rows(text, delimiter);
        sheet::records_from_rows(&rows, factory, self.base_year)
    }

    fn parse_workbook(&self, bytes: &[u8], factory: Factory) -> Result<ParsedFile> {
        let rows = workbook::read_rows(bytes)?;
        sheet::records_from_rows(&rows, factory, self.base_year)
    }

    fn parse_json(&self, bytes: &[u8], factory: Factory) -> Result<ParsedFile> {
        let payload: JsonPayload = serde_json::from_slice(bytes)
            .map_err(|err| LoadplanError::from(InfraError::from(err)))?;
        let mut orders = match payload {
            JsonPayload::Records(records) | JsonPayload::Wrapped { records } => records,
        };

        let mut statistics = ParseStatistics {
            rows_read: orders.len() as u64,
            records: orders.len() as u64,
            ..ParseStatistics::default()
        };
        for record in &mut orders {
            if record.factory == Factory::Unknown {
                record.factory = factory;
            }
            if record.destination.trim().is_empty() {
                record.destination = UNKNOWN_DESTINATION.to_string();
                statistics.empty_destinations += 1;
            }
        }
        Ok(ParsedFile { orders, statistics })
    }
}

impl FileParser for LoadplanParser {
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    fn parse(&self, bytes: &[u8], filename: &str) -> Result<ParsedFile> {
        let factory = Factory::from_file_name(filename).unwrap_or_default();
        let extension = filename.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());

        let parsed = match extension.as_deref() {
            Some("csv") => self.parse_csv(bytes, factory),
            Some("json") => self.parse_json(bytes, factory),
            Some("xlsx" | "xls") => self.parse_workbook(bytes, factory),
            _ => Err(LoadplanError::Parse(format!("unsupported file type: {filename}"))),
        }?;

        debug!(%factory, records = parsed.orders.len(), "file parsed");
        Ok(parsed)
    }
}
