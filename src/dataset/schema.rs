//! Column layout of the ECDC worksheet, resolved from its header row.
//!
//! The published files changed header spelling over time (`DateRep` vs
//! `dateRep`, `Countries and territories` vs `countriesAndTerritories`), so
//! names are compared after lower-casing and removing spaces and underscores.

use calamine::Data;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("worksheet has no header row")]
    EmptySheet,
    #[error("missing required column `{0}`")]
    MissingColumn(&'static str),
    #[error("row {row}: cannot read `{column}` from {value}")]
    InvalidCell {
        row: usize,
        column: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
/// Positions of the known columns within a row.
pub struct Schema {
    pub date: usize,
    pub cases: usize,
    pub deaths: usize,
    pub geo_id: usize,
    pub country: Option<usize>,
    pub country_code: Option<usize>,
    pub population: Option<usize>,
}

impl Schema {
    pub fn from_header(header: &[Data]) -> Result<Self, SchemaError> {
        let names: Vec<String> = header.iter().map(|cell| normalise(&cell.to_string())).collect();

        let find = |wanted: &str| names.iter().position(|name| name == wanted);
        let require = |wanted: &'static str| {
            find(&normalise(wanted)).ok_or(SchemaError::MissingColumn(wanted))
        };

        Ok(Schema {
            date: require("dateRep")?,
            cases: require("cases")?,
            deaths: require("deaths")?,
            geo_id: require("geoId")?,
            country: find("countriesandterritories"),
            country_code: find("countryterritorycode"),
            population: names.iter().position(|name| name.starts_with("popdata")),
        })
    }
}

fn normalise(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

// -- Tests -------------------------------------------------------------------
