// src/error.rs
use thiserror::Error;

use crate::panel::DomainIssue;

/// Everything that can stop (or flag) a panel build.
///
/// Row numbers are 1-based data rows of the uploaded file (the header is
/// row 0), so they match what a user sees when opening the sheet.
#[derive(Error, Debug)]
pub enum PanelError {
    #[error("could not read `{file}`: {reason}")]
    Ingest { file: String, reason: String },

    #[error("missing required column(s) after normalization: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("{0}")]
    Domain(DomainIssue),

    #[error("row {row}: column `{column}` has invalid value {value:?}")]
    InvalidCell {
        row: usize,
        column: String,
        value: String,
    },

    #[error("duplicate observation for ({entity}, {year}) at rows {first_row} and {second_row}")]
    DuplicateKey {
        entity: String,
        year: i32,
        first_row: usize,
        second_row: usize,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),
}

pub type Result<T> = std::result::Result<T, PanelError>;
