//! The downloaded worksheet as a typed, ordered table of daily records.

pub mod record;
pub mod schema;

use std::{fmt, io::Cursor};

use calamine::{Data, Reader, Xlsx, XlsxError};
use thiserror::Error;
use tracing::debug;

pub use record::Record;
pub use schema::{Schema, SchemaError};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open workbook: {0}")]
    Workbook(#[from] XlsxError),
    #[error("workbook has no worksheet")]
    NoWorksheet,
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[derive(Debug, Clone, Default)]
/// Records in the order they appear in the file (newest first for ECDC data).
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Dataset { records }
    }

    /// Reads the first worksheet of an `.xlsx` workbook.
    pub fn from_xlsx(bytes: Vec<u8>) -> Result<Self, LoadError> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(LoadError::NoWorksheet)??;

        Ok(Self::from_rows(range.rows())?)
    }

    /// Builds the table from raw rows, the first of which is the header.
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a [Data]>) -> Result<Self, SchemaError> {
        let mut rows = rows.into_iter();
        let header = rows.next().ok_or(SchemaError::EmptySheet)?;
        let schema = Schema::from_header(header)?;
        debug!(?schema, "resolved worksheet columns");

        let mut records = Vec::new();
        // Row numbers are 1-based and count the header, as in a spreadsheet.
        for (idx, row) in rows.enumerate() {
            if record::is_blank(row) {
                continue;
            }
            records.push(Record::from_row(row, &schema, idx + 2)?);
        }

        Ok(Dataset::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records for one geoId, in file order.
    pub fn country<'a>(&'a self, geo_id: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
        self.records.iter().filter(move |r| r.geo_id == geo_id)
    }

    /// The first `rows` records, formatted as a table.
    pub fn preview(&self, rows: usize) -> Preview<'_> {
        Preview {
            records: &self.records[..rows.min(self.records.len())],
            total: self.records.len(),
        }
    }
}

pub struct Preview<'a> {
    records: &'a [Record],
    total: usize,
}

impl fmt::Display for Preview<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<10}  {:>8}  {:>6}  {:<5}  {:<30}  {:<4}  {:>12}",
            "dateRep", "cases", "deaths", "geoId", "countriesAndTerritories", "code", "population"
        )?;
        for r in self.records {
            writeln!(
                f,
                "{:<10}  {:>8}  {:>6}  {:<5}  {:<30}  {:<4}  {:>12}",
                r.date.format("%Y-%m-%d").to_string(),
                r.cases,
                r.deaths,
                r.geo_id,
                r.country.as_deref().unwrap_or(""),
                r.country_code.as_deref().unwrap_or(""),
                r.population.map(|p| p.to_string()).unwrap_or_default()
            )?;
        }
        write!(f, "[{} rows]", self.total)
    }
}

// -- Tests -------------------------------------------------------------------
