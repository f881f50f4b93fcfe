use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Invalid run name '{name}': must start alphanumeric and contain only [A-Za-z0-9._-]")]
    InvalidRunName { name: String },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid report {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No reports to compare")]
    NoReports,

    #[error("Unknown baseline prompt version '{version}' (available: {available})")]
    UnknownBaseline { version: String, available: String },

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}
