//! Upload: read a file into a normalized [`Table`].
//!
//! The reader is picked by extension. Delimited text is typed column by
//! column (integers, floats, booleans, else mixed objects); workbooks are
//! read from their first sheet when the `xlsx` feature is enabled.

use crate::csv_reader::{self, CsvData};
use crate::data::{Column, ColumnData, Table, Value};
use crate::error::LoadError;
use crate::normalize::normalize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Cell texts read as missing.
pub const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-NaN", "-nan", "<NA>", "N/A", "NA", "NULL", "NaN", "None",
    "n/a", "nan", "null",
];

/// Input container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Json,
    Spreadsheet,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(InputFormat::Csv),
            "json" => Ok(InputFormat::Json),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(InputFormat::Spreadsheet),
            other => Err(LoadError::UnsupportedFormat(if other.is_empty() {
                path.display().to_string()
            } else {
                format!(".{other}")
            })),
        }
    }
}

/// Read and normalize the file at `path`.
pub fn read_path(path: &Path) -> Result<Table, LoadError> {
    let format = InputFormat::from_path(path)?;
    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let table = match format {
        InputFormat::Csv => {
            let file = File::open(path).map_err(io_err)?;
            read_csv(BufReader::new(file))?
        }
        InputFormat::Json => {
            let mut text = String::new();
            File::open(path)
                .and_then(|mut f| f.read_to_string(&mut text))
                .map_err(io_err)?;
            read_json(&text)?
        }
        InputFormat::Spreadsheet => read_spreadsheet(path)?,
    };

    tracing::info!(path = %path.display(), rows = table.height(), columns = table.width(), "dataset loaded");
    Ok(table)
}

/// Typed, normalized table from delimited text.
pub fn read_csv<R: Read>(reader: R) -> Result<Table, LoadError> {
    let data = csv_reader::read_csv(reader)?;
    Ok(normalize(&table_from_records(data)?))
}

/// Typed, normalized table from a JSON array of objects.
pub fn read_json(text: &str) -> Result<Table, LoadError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let table = Table::from_json(&value).map_err(|e| LoadError::Malformed(e.to_string()))?;
    Ok(normalize(&table))
}

#[cfg(feature = "xlsx")]
fn read_spreadsheet(path: &Path) -> Result<Table, LoadError> {
    Ok(normalize(&crate::xlsx::read_workbook(path)?))
}

#[cfg(not(feature = "xlsx"))]
fn read_spreadsheet(path: &Path) -> Result<Table, LoadError> {
    Err(LoadError::UnsupportedFormat(format!(
        "{} (built without spreadsheet support)",
        path.display()
    )))
}

/// Type every column of raw string records.
pub fn table_from_records(data: CsvData) -> Result<Table, LoadError> {
    let CsvData { headers, rows } = data;
    let columns = headers
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let cells = rows.iter().map(|row| parse_cell(&row[i])).collect();
            Column::new(name, ColumnData::infer(cells))
        })
        .collect();
    Table::new(columns).map_err(|e| LoadError::Malformed(e.to_string()))
}

fn parse_cell(raw: &str) -> Value {
    if NA_VALUES.contains(&raw) {
        return Value::Null;
    }
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return Value::Float(f);
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::Text(raw.to_string())
}
