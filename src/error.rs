//! Error types surfaced to callers.
//!
//! Only structural problems are errors. Bad cells, incomplete rows and
//! duplicate observations are logged and skipped by the loaders.

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("marker row {0:?} not found in sheet")]
    MissingMarker(String),

    #[error("header row not found (input has no non-empty rows)")]
    MissingHeader,

    #[error("column {0:?} not found in header")]
    MissingColumn(String),

    #[error("no usable numeric data in input")]
    NoData,

    #[error("series mixes yearly and quarterly periods ({0} and {1})")]
    MixedPeriods(String, String),

    #[error("worksheet {0:?} not found")]
    MissingSheet(String),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid color {value:?} for {entity:?} (expected #RRGGBB)")]
    InvalidColor { entity: String, value: String },

    #[error("invalid fade hold {0} (expected 0 < hold < 1)")]
    InvalidFade(f64),

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        source: reqwest::Error,
    },

    #[error("request to {url} failed with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("unsupported source {0:?}")]
    Unsupported(String),

    #[error(transparent)]
    Load(#[from] LoadError),
}
