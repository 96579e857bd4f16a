//! Export of the current table.
//!
//! CSV is always available. The spreadsheet format goes through an optional
//! [`SpreadsheetWriter`]; when none is compiled in, or it fails, the export
//! degrades to CSV and carries an [`ExportDegraded`] notice instead of
//! failing.

use crate::data::{Table, Value, TIMESTAMP_FORMAT};
use crate::error::ExportDegraded;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_FILE_STEM: &str = "processed_dataset";
pub const DEFAULT_SHEET_NAME: &str = "Processed Data";

/// Seam for the optional spreadsheet codec.
pub trait SpreadsheetWriter {
    fn write(&self, table: &Table, sheet_name: &str) -> anyhow::Result<Vec<u8>>;
}

/// The spreadsheet writer compiled into this build, if any.
pub fn spreadsheet_writer() -> Option<Box<dyn SpreadsheetWriter>> {
    #[cfg(feature = "xlsx")]
    {
        Some(Box::new(crate::xlsx::XlsxWriter))
    }
    #[cfg(not(feature = "xlsx"))]
    {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            other => Err(format!("unknown export format '{other}' (expected csv or xlsx)")),
        }
    }
}

/// Naming for the downloadable file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub file_stem: String,
    pub sheet_name: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            file_stem: DEFAULT_FILE_STEM.to_string(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
        }
    }
}

/// A finished export payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub bytes: Vec<u8>,
    /// Format actually produced, CSV after a fallback
    pub format: ExportFormat,
    pub file_stem: String,
    pub degraded: Option<ExportDegraded>,
}

impl Export {
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.file_stem, self.format.extension())
    }

    pub fn mime(&self) -> &'static str {
        self.format.mime()
    }

    /// Download button text.
    pub fn label(&self) -> &'static str {
        match (&self.format, &self.degraded) {
            (ExportFormat::Xlsx, _) => "Download as Excel",
            (ExportFormat::Csv, None) => "Download as CSV",
            (ExportFormat::Csv, Some(ExportDegraded::CodecUnavailable)) => {
                "Download as CSV (Excel not available)"
            }
            (ExportFormat::Csv, Some(ExportDegraded::CodecFailed(_))) => {
                "Download as CSV (Error occurred)"
            }
        }
    }
}

/// Serialize `table` as CSV: header row, no index column.
pub fn to_csv(table: &Table) -> Vec<u8> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let header: Vec<&str> = table.column_names();
    let mut result = writer.write_record(&header);

    for row in 0..table.height() {
        if result.is_err() {
            break;
        }
        let record: Vec<String> = table.row(row).iter().map(csv_cell).collect();
        result = writer.write_record(&record);
    }

    match (result, writer.into_inner()) {
        (Ok(()), Ok(bytes)) => bytes,
        // In-memory writer; only reachable on allocation failure
        (res, inner) => {
            tracing::error!(ok = res.is_ok(), flushed = inner.is_ok(), "CSV serialization failed");
            Vec::new()
        }
    }
}

fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Float(f) if f.is_nan() => String::new(),
        Value::Timestamp(t) => t.format(TIMESTAMP_FORMAT).to_string(),
        other => other.to_string(),
    }
}

/// Produce the requested export, degrading to CSV rather than failing.
pub fn export(
    table: &Table,
    format: ExportFormat,
    writer: Option<&dyn SpreadsheetWriter>,
    options: &ExportOptions,
) -> Export {
    let csv = |degraded| Export {
        bytes: to_csv(table),
        format: ExportFormat::Csv,
        file_stem: options.file_stem.clone(),
        degraded,
    };

    match (format, writer) {
        (ExportFormat::Csv, _) => csv(None),
        (ExportFormat::Xlsx, None) => {
            let notice = ExportDegraded::CodecUnavailable;
            tracing::warn!(%notice, "falling back to CSV");
            csv(Some(notice))
        }
        (ExportFormat::Xlsx, Some(writer)) => match writer.write(table, &options.sheet_name) {
            Ok(bytes) => Export {
                bytes,
                format: ExportFormat::Xlsx,
                file_stem: options.file_stem.clone(),
                degraded: None,
            },
            Err(err) => {
                let notice = ExportDegraded::CodecFailed(format!("{err:#}"));
                tracing::warn!(%notice, "falling back to CSV");
                csv(Some(notice))
            }
        },
    }
}
