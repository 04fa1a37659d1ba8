//! Error types for convolution catalog ingestion.

use std::num::ParseIntError;
use thiserror::Error;

/// Errors that can occur while loading or querying a convolution catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("The catalog has no header row")]
    MissingHeader,

    #[error(
        "Row {row} has {found} columns but the header declares {expected}: '{line}'"
    )]
    ColumnCountMismatch {
        row: usize,
        expected: usize,
        found: usize,
        line: String,
    },

    #[error("Row {row}, field '{field}': '{value}' is not an unsigned integer ({source})")]
    InvalidValue {
        row: usize,
        field: String,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("Convolution spec '{label}' has no field '{field}'")]
    MissingField { label: String, field: String },
}
