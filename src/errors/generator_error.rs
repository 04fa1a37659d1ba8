//! Error types for tensor data generation.

use thiserror::Error;

/// Errors that can occur while configuring the data generator.
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Invalid normal distribution parameters: mean {mean}, std_dev {std_dev}")]
    InvalidDistribution { mean: f32, std_dev: f32 },
}
