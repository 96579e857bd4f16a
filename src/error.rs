//! Error types for the workbench
//!
//! Every failure is recovered at the boundary where it happens (load, dispatch,
//! chart build/render, export) and surfaced as a user-visible message.

use std::path::PathBuf;
use thiserror::Error;

/// The upload could not be turned into a table.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("File is empty")]
    Empty,

    #[error("Malformed input: {0}")]
    Malformed(String),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "xlsx")]
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),
}

/// A menu selection could not be applied to the current table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Unknown operation category '{0}'")]
    UnknownCategory(String),

    #[error("Unknown operation '{label}' in category '{category}'")]
    UnknownOperation { category: String, label: String },

    #[error("Error applying operation: {0}")]
    OperationFailed(String),
}

/// The user's chart selections do not form a valid chart spec.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartBuildError {
    #[error("{chart} chart requires a '{field}' selection")]
    MissingField { chart: String, field: String },

    #[error("Column '{0}' not found")]
    UnknownColumn(String),

    #[error("'{field}' is not available for {chart} charts")]
    NotApplicable { chart: String, field: String },

    #[error("'{field}' must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("'{value}' is not a valid choice for '{field}'")]
    InvalidChoice { field: String, value: String },

    #[error("{chart} chart needs a numeric '{field}' column, but '{column}' is {dtype}")]
    NotNumeric {
        chart: String,
        field: String,
        column: String,
        dtype: String,
    },

    #[error("Unknown chart type '{0}'")]
    UnknownChartType(String),
}

/// Materialising a chart failed. The table and spec are left untouched.
#[derive(Error, Debug)]
pub enum ChartError {
    #[error(transparent)]
    Build(#[from] ChartBuildError),

    #[error("Error generating chart: {0}")]
    Render(String),
}

/// The preferred export format was unavailable; CSV was produced instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExportDegraded {
    #[error("Excel export is not available in this build; exported CSV instead")]
    CodecUnavailable,

    #[error("Excel export failed ({0}); exported CSV instead")]
    CodecFailed(String),
}

/// A navigation or session action is not valid in the current state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("No dataset loaded. Please upload data first.")]
    NoTable,

    #[error("Cannot {action} from the {page} page")]
    InvalidTransition { page: String, action: String },
}
