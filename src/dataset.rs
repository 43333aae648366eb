//! CSV dataset loading.
//!
//! A [`Table`] holds the header row and the raw records of one CSV file,
//! and resolves columns by name. Every failure is reported as a
//! [`DatasetError`] so callers can tell a missing input file apart from
//! malformed content.

use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading or reading a CSV dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The input file does not exist.
    #[error("input file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// The input file exists but could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not valid CSV.
    #[error("malformed CSV in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A required column is absent from the header row.
    #[error("column '{column}' not found in {}", .path.display())]
    MissingColumn { path: PathBuf, column: String },

    /// A numeric cell could not be parsed.
    #[error("invalid number '{value}' in column '{column}' at row {row} of {}", .path.display())]
    InvalidNumber {
        path: PathBuf,
        column: String,
        row: usize,
        value: String,
    },

    /// Summing a column exceeded the representable range.
    #[error("sum of column '{column}' overflows in {}", .path.display())]
    SumOverflow { path: PathBuf, column: String },
}

/// Cell values treated as missing in numeric columns.
const MISSING_MARKERS: &[&str] = &["", "na", "n/a", "nan", "null", "none"];

/// An in-memory CSV file.
#[derive(Debug, Clone)]
pub struct Table {
    source: PathBuf,
    headers: Vec<String>,
    records: Vec<StringRecord>,
}

impl Table {
    /// Load a CSV file with a header row.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => DatasetError::NotFound {
                path: path.to_path_buf(),
            },
            _ => DatasetError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        Self::from_reader(file, path)
    }

    /// Parse CSV from any reader. `source` is only used in messages.
    pub fn from_reader<R: Read>(reader: R, source: impl Into<PathBuf>) -> Result<Self, DatasetError> {
        let source = source.into();
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| DatasetError::Csv {
                path: source.clone(),
                source: e,
            })?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let records = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DatasetError::Csv {
                path: source.clone(),
                source: e,
            })?;

        debug!("Columns in {}: {:?}", source.display(), headers);
        debug!("Loaded {} rows from {}", records.len(), source.display());

        Ok(Self {
            source,
            headers,
            records,
        })
    }

    /// Path the table was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Header names in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Trim and capitalize every header ("  COUNTRY " becomes "Country").
    pub fn normalize_headers(&mut self) {
        for header in &mut self.headers {
            *header = capitalize(header.trim());
        }
    }

    /// Resolve a column index by exact header name.
    pub fn column(&self, name: &str) -> Result<usize, DatasetError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DatasetError::MissingColumn {
                path: self.source.clone(),
                column: name.to_string(),
            })
    }

    /// Iterate over data rows.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.records.iter().enumerate().map(move |(index, record)| Row {
            table: self,
            index,
            record,
        })
    }
}

/// A borrowed view of one data row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    index: usize,
    record: &'a StringRecord,
}

impl<'a> Row<'a> {
    /// Trimmed text of a cell; absent trailing cells read as empty.
    pub fn text(&self, column: usize) -> &'a str {
        self.record.get(column).map(str::trim).unwrap_or("")
    }

    /// Numeric value of a cell, `None` when the cell is missing.
    pub fn number(&self, column: usize) -> Result<Option<f64>, DatasetError> {
        let raw = self.text(column);
        if MISSING_MARKERS.contains(&raw.to_lowercase().as_str()) {
            return Ok(None);
        }

        let cleaned = raw.replace(',', "");
        match cleaned.parse::<f64>() {
            Ok(v) if v.is_nan() => Ok(None),
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(self.invalid(column, raw)),
        }
    }

    /// Integer value of a cell (accepts "2024" and "2024.0").
    pub fn integer(&self, column: usize) -> Result<Option<i64>, DatasetError> {
        match self.number(column)? {
            Some(v) if v.fract() == 0.0 => Ok(Some(v as i64)),
            Some(_) => Err(self.invalid(column, self.text(column))),
            None => Ok(None),
        }
    }

    /// Whole part of a cell holding at least one unit.
    ///
    /// Missing cells and values below one read as `None`; values too large
    /// for a `u64` are invalid.
    pub fn count(&self, column: usize) -> Result<Option<u64>, DatasetError> {
        match self.number(column)? {
            Some(v) if v >= u64::MAX as f64 => Err(self.invalid(column, self.text(column))),
            Some(v) if v >= 1.0 => Ok(Some(v.trunc() as u64)),
            _ => Ok(None),
        }
    }

    fn invalid(&self, column: usize, value: &str) -> DatasetError {
        DatasetError::InvalidNumber {
            path: self.table.source.clone(),
            column: self
                .table
                .headers
                .get(column)
                .cloned()
                .unwrap_or_else(|| column.to_string()),
            // 1-based, counting the header line
            row: self.index + 2,
            value: value.to_string(),
        }
    }
}

/// Upper-case the first character and lower-case the rest.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(csv: &str) -> Table {
        Table::from_reader(csv.as_bytes(), "inline.csv").unwrap()
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("COUNTRY"), "Country");
        assert_eq!(capitalize("year"), "Year");
        assert_eq!(capitalize("event TYPE"), "Event type");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_normalize_headers() {
        let mut t = table(" country ,YEAR,fatalities\nMali,2020,3\n");
        t.normalize_headers();
        assert_eq!(t.headers(), &["Country", "Year", "Fatalities"]);
        assert_eq!(t.column("Year").unwrap(), 1);
    }

    #[test]
    fn test_missing_column() {
        let t = table("a,b\n1,2\n");
        let err = t.column("c").unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn { ref column, .. } if column == "c"));
        assert!(err.to_string().contains("inline.csv"));
    }

    #[test]
    fn test_numbers_and_missing_values() {
        let t = table("v,w\n12.5,x\n,x\nNaN,x\n\"1,200\",x\n");
        let values: Vec<Option<f64>> = t.rows().map(|r| r.number(0).unwrap()).collect();
        assert_eq!(values, vec![Some(12.5), None, None, Some(1200.0)]);
    }

    #[test]
    fn test_invalid_number_reports_row() {
        let t = table("v\n1\nabc\n");
        let rows: Vec<_> = t.rows().collect();
        let err = rows[1].number(0).unwrap_err();
        match err {
            DatasetError::InvalidNumber { column, row, value, .. } => {
                assert_eq!(column, "v");
                assert_eq!(row, 3);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_number_rejects_infinity() {
        let t = table("v\ninf\n-inf\nInfinity\n1e400\n");
        for row in t.rows() {
            let err = row.number(0).unwrap_err();
            assert!(matches!(err, DatasetError::InvalidNumber { .. }));
        }
    }

    #[test]
    fn test_count_truncates_and_skips_fractions() {
        let t = table("v\n1.9\n0.4\n-3\nNA\n1e20\n");
        let rows: Vec<_> = t.rows().collect();
        assert_eq!(rows[0].count(0).unwrap(), Some(1));
        assert_eq!(rows[1].count(0).unwrap(), None);
        assert_eq!(rows[2].count(0).unwrap(), None);
        assert_eq!(rows[3].count(0).unwrap(), None);
        assert!(matches!(rows[4].count(0), Err(DatasetError::InvalidNumber { .. })));
    }

    #[test]
    fn test_integer_accepts_float_notation() {
        let t = table("year\n2024\n2024.0\n2024.5\n");
        let rows: Vec<_> = t.rows().collect();
        assert_eq!(rows[0].integer(0).unwrap(), Some(2024));
        assert_eq!(rows[1].integer(0).unwrap(), Some(2024));
        assert!(rows[2].integer(0).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv");
        let err = Table::load(&path).unwrap_err();
        assert!(matches!(err, DatasetError::NotFound { .. }));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "Entity,Year\nEurope,2024\n").unwrap();

        let t = Table::load(&path).unwrap();
        assert_eq!(t.len(), 1);
        assert!(!t.is_empty());
        assert_eq!(t.source(), path.as_path());
        assert_eq!(t.rows().next().unwrap().text(0), "Europe");
    }
}
