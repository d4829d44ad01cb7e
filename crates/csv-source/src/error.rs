//! Error types for the CSV action source.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CsvSourceError {
    #[error("Failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid action row: {0}")]
    InvalidRow(String),
}
