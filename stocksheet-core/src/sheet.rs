//! Whole-table CSV storage.
//!
//! The backing "spreadsheet" is a single CSV file treated as a flat table:
//! first record is the header row, everything below is data. There is no
//! partial I/O - the adapter reads the entire table at the start of every
//! request and writes it back in full after a mutation, so the file on disk
//! is always a complete, consistent snapshot.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from loading or saving the backing table.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// An in-memory snapshot of the table: one header row plus data rows of raw
/// text cells. Rows may be ragged; missing cells read as empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Returns the cell at `(row, col)`, empty string when out of range.
    pub fn cell<'a>(&'a self, row: &'a [String], col: usize) -> &'a str {
        row.get(col).map(String::as_str).unwrap_or("")
    }

    /// Writes `value` at `(row_index, col)`, growing the row with empty
    /// cells as needed.
    pub fn set_cell(&mut self, row_index: usize, col: usize, value: String) {
        let row = &mut self.rows[row_index];
        if row.len() <= col {
            row.resize(col + 1, String::new());
        }
        row[col] = value;
    }
}

/// A CSV file acting as the single sheet of the row store.
#[derive(Debug, Clone)]
pub struct CsvSheet {
    path: PathBuf,
}

impl CsvSheet {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the whole table. A missing or empty file yields an empty table.
    pub fn load(&self) -> Result<Table, SheetError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Table::default()),
            Err(e) => {
                return Err(SheetError::Io {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut records = reader.records();
        let headers = match records.next() {
            Some(record) => self.record_to_row(record)?,
            None => return Ok(Table::default()),
        };

        let mut rows = Vec::new();
        for record in records {
            rows.push(self.record_to_row(record)?);
        }

        Ok(Table { headers, rows })
    }

    /// Writes the whole table back, replacing the file contents.
    pub fn save(&self, table: &Table) -> Result<(), SheetError> {
        let file = File::create(&self.path).map_err(|e| SheetError::Io {
            path: self.path.clone(),
            source: e,
        })?;

        let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(file);
        writer
            .write_record(&table.headers)
            .and_then(|_| {
                for row in &table.rows {
                    writer.write_record(row)?;
                }
                writer.flush().map_err(csv::Error::from)
            })
            .map_err(|e| SheetError::Csv {
                path: self.path.clone(),
                source: e,
            })
    }

    fn record_to_row(
        &self,
        record: Result<csv::StringRecord, csv::Error>,
    ) -> Result<Vec<String>, SheetError> {
        let record = record.map_err(|e| SheetError::Csv {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(record.iter().map(str::to_string).collect())
    }
}
