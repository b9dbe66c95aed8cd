//! Shared CSV ingestion helpers.
//!
//! Imports are row-isolated: a malformed row is recorded with its index and
//! message while the rest of the file keeps loading. Callers decide whether
//! a non-empty error list is fatal.

use csv::ReaderBuilder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// One rejected row, 1-based index relative to the first data row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    pub row_index: usize,
    pub message: String,
}

/// Outcome of loading a typed CSV.
#[derive(Debug, Clone)]
pub struct ImportResult<T> {
    pub records: Vec<T>,
    pub errors: Vec<RowError>,
}

impl<T> Default for ImportResult<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl<T> ImportResult<T> {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Deserializes and validates rows of a headered CSV in one pass,
/// capturing per-row failures under the row's true index.
pub fn read_rows<T, U, R>(
    reader: R,
    mut convert: impl FnMut(T) -> Result<U, String>,
) -> ImportResult<U>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut result = ImportResult::default();
    for (idx, row) in csv_reader.deserialize::<T>().enumerate() {
        let row_index = idx + 1;
        match row.map_err(|e| e.to_string()).and_then(&mut convert) {
            Ok(record) => result.records.push(record),
            Err(message) => result.errors.push(RowError { row_index, message }),
        }
    }
    result
}
