//! ==============================================================================
//! source.rs - csv snapshot loader
//! ==============================================================================
//!
//! purpose:
//!     reads the snapshot file once per render pass and hands back the
//!     first row as a typed `Reading`.
//!
//! failure model:
//!     every defect is terminal for the pass. there is no default
//!     substitution and no retry; the caller gets a `DataLoadError`.
//!
//! ==============================================================================

use crate::domain::Reading;

use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// columns a snapshot must carry, in display order
pub const REQUIRED_COLUMNS: [&str; 11] = [
    "last_reading_time",
    "site_status",
    "voltage1",
    "voltage2",
    "voltage3",
    "voltage4",
    "door_status",
    "fuel_level",
    "gauge_value",
    "temperature",
    "humidity",
];

/// rows shown under "Dataset Overview"
pub const HEAD_ROWS: usize = 5;

#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("cannot open data source {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("data source has no rows")]
    Empty,

    #[error("column '{column}' holds non-numeric value '{value}'")]
    InvalidField { column: String, value: String },
}

/// the whole source file as strings
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// open, read fully, and check required columns
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DataLoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DataLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: std::io::Read>(input: R) -> Result<Self, DataLoadError> {
        let mut reader = csv::Reader::from_reader(input);
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|col| !headers.iter().any(|h| h == *col))
            .map(|col| col.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DataLoadError::MissingColumns(missing));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// up to the first `n` rows, all columns
    pub fn head(&self, n: usize) -> &[Vec<String>] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// first row as a reading; later rows are ignored
    pub fn first_reading(&self) -> Result<Reading, DataLoadError> {
        let row = self.rows.first().ok_or(DataLoadError::Empty)?;
        let cell = |column: &str| self.cell(row, column).to_string();
        let text = |column: &str| self.cell(row, column).trim().to_string();
        let number = |column: &str| -> Result<f64, DataLoadError> {
            let raw = self.cell(row, column);
            raw.trim().parse::<f64>().map_err(|_| DataLoadError::InvalidField {
                column: column.to_string(),
                value: raw.to_string(),
            })
        };

        Ok(Reading {
            last_reading_time: cell("last_reading_time"),
            site_status: cell("site_status"),
            voltages: [
                number("voltage1")?,
                number("voltage2")?,
                number("voltage3")?,
                number("voltage4")?,
            ],
            voltage_text: [text("voltage1"), text("voltage2"), text("voltage3"), text("voltage4")],
            door_status: cell("door_status"),
            fuel_level: number("fuel_level")?,
            fuel_level_text: text("fuel_level"),
            gauge_value: number("gauge_value")?,
            temperature: number("temperature")?,
            humidity: number("humidity")?,
        })
    }

    fn cell<'a>(&'a self, row: &'a [String], column: &str) -> &'a str {
        self.headers
            .iter()
            .position(|h| h == column)
            .and_then(|i| row.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }
}
