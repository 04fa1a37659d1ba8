//! Error types for benchmark orchestration.

use super::{CatalogError, GeneratorError};
use thiserror::Error;

/// Errors that abort a benchmark run.
///
/// A failing spec stops the whole run; specs after it are not executed.
#[derive(Error, Debug)]
pub enum BenchError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error("Failed to parse configuration file '{path}': {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration validation error for field '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error(
        "Convolution spec '{label}': output batch No={output} does not match input batch Ni={input}"
    )]
    BatchMismatch {
        label: String,
        input: u64,
        output: u64,
    },

    #[error(
        "Convolution spec '{label}': G={groups} must divide Ci={in_channels} and Do={out_channels}"
    )]
    InvalidGroups {
        label: String,
        groups: u64,
        in_channels: u64,
        out_channels: u64,
    },

    #[error("Convolution spec '{label}': size derived from '{field}' does not fit in usize")]
    ShapeOverflow { label: String, field: String },

    #[error("Failed to emit benchmark output: {0}")]
    Output(#[from] std::io::Error),
}
