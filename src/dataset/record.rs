//! A single daily report for one country.

use calamine::Data;
use chrono::{Days, NaiveDate};

use super::schema::{Schema, SchemaError};

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub date: NaiveDate,
    pub cases: i64,
    pub deaths: i64,
    pub geo_id: String,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub population: Option<i64>,
}

impl Record {
    /// Converts a worksheet row. `row_number` is only used for error messages.
    pub fn from_row(row: &[Data], schema: &Schema, row_number: usize) -> Result<Self, SchemaError> {
        let cell = |idx: usize| row.get(idx).unwrap_or(&Data::Empty);
        let invalid = |column: &'static str, idx: usize| SchemaError::InvalidCell {
            row: row_number,
            column,
            value: format!("{:?}", cell(idx)),
        };

        let date = parse_date(cell(schema.date)).ok_or_else(|| invalid("dateRep", schema.date))?;
        let cases = parse_count(cell(schema.cases)).ok_or_else(|| invalid("cases", schema.cases))?;
        let deaths =
            parse_count(cell(schema.deaths)).ok_or_else(|| invalid("deaths", schema.deaths))?;
        let geo_id = parse_str(cell(schema.geo_id)).ok_or_else(|| invalid("geoId", schema.geo_id))?;

        Ok(Record {
            date,
            cases,
            deaths,
            geo_id,
            country: schema.country.and_then(|idx| parse_str(cell(idx))),
            country_code: schema.country_code.and_then(|idx| parse_str(cell(idx))),
            population: schema.population.and_then(|idx| parse_optional_count(cell(idx))),
        })
    }
}

pub fn is_blank(row: &[Data]) -> bool {
    row.iter().all(|cell| match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    })
}

// Blank counts are read as zero so that sums skip them.
fn parse_count(cell: &Data) -> Option<i64> {
    match cell {
        Data::Int(v) => Some(*v),
        Data::Float(v) if v.fract() == 0.0 => Some(*v as i64),
        Data::String(s) if s.trim().is_empty() => Some(0),
        Data::String(s) => s.trim().parse().ok(),
        Data::Empty => Some(0),
        _ => None,
    }
}

// Optional counts are absent rather than zero when blank.
fn parse_optional_count(cell: &Data) -> Option<i64> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.trim().is_empty() => None,
        other => parse_count(other),
    }
}

// Date-formatted cells carry the workbook's date system (1900 or 1904).
fn parse_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::DateTime(dt) => dt.as_datetime().map(|d| d.date()),
        Data::Float(v) => from_excel_serial(*v),
        Data::Int(v) => from_excel_serial(*v as f64),
        Data::DateTimeIso(s) | Data::String(s) => parse_date_str(s.trim()),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let iso = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(iso, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
        .ok()
}

// Plain numbers are taken as 1900-system serials: day zero is 1899-12-30
// once the 1900 leap year bug is accounted for.
fn from_excel_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.floor() as u64))
}

fn parse_str(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => Some(s.trim().to_string()).filter(|v| !v.is_empty()),
        Data::Empty => None,
        other => Some(other.to_string()),
    }
}

// -- Tests -------------------------------------------------------------------
