//! Error types for the convolution benchmark harness.
//!
//! Each concern gets its own error enum; the orchestrator aggregates them in
//! [`BenchError`] so a run can fail with a single typed error.

mod bench_error;
mod catalog_error;
mod generator_error;

pub use bench_error::BenchError;
pub use catalog_error::CatalogError;
pub use generator_error::GeneratorError;

/// Result type alias for catalog operations.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Result type alias for data generation.
pub type GeneratorResult<T> = std::result::Result<T, GeneratorError>;

/// Result type alias for benchmark orchestration.
pub type BenchResult<T> = std::result::Result<T, BenchError>;
