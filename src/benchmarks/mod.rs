//! Benchmark orchestration for convolution kernels.
//!
//! [`ConvBench`] walks a [`ConvCatalog`](crate::catalog::ConvCatalog), builds
//! the tensors for each spec and runs the direct kernel, the baseline kernel,
//! or both for a correctness comparison.

pub mod benchmark_runner;
pub mod benchmark_types;
pub mod conv_setup;

pub use benchmark_runner::{CONFIG_PATH_ENV, ConfigLoader, ConvBench, DEFAULT_CONFIG_PATH};
pub use benchmark_types::{HarnessConfig, RunStrategy, SpecReport};
pub use conv_setup::ConvSetup;
