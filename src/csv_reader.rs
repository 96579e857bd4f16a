// Delimited-text reading into raw string records

use crate::error::LoadError;
use std::io::Read;

/// Header row plus string records, before any typing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Read CSV from any reader. Rows must match the header width.
pub fn read_csv<R: Read>(reader: R) -> Result<CsvData, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_matches('\u{feff}').to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(LoadError::Empty);
    }

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != headers.len() {
            return Err(LoadError::Malformed(format!(
                "row {} has {} fields, expected {}",
                i + 1,
                record.len(),
                headers.len()
            )));
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(CsvData { headers, rows })
}
