//! Micro-benchmark harness for convolution kernels.
//!
//! This library reads a catalog of convolution shapes, synthesizes input,
//! kernel and bias tensors for each one, and runs a pluggable convolution
//! implementation under one of three strategies: timing the direct kernel,
//! timing the baseline kernel, or checking the two against each other.
//! Kernels attribute time to sub-steps through a registry of phase timers.

pub mod benchmarks;
pub mod catalog;
pub mod data_generator;
pub mod errors;
pub mod kernels;
pub mod shape;
pub mod tensor;
pub mod timing;

pub use benchmarks::{ConvBench, HarnessConfig, RunStrategy, SpecReport};
pub use catalog::{ConvCatalog, ConvSpec};
pub use data_generator::{DataGenerator, DataStrategy, DistributionParams};
pub use kernels::{ConvGeometry, ConvKernel, ConvOperands, KernelPair};
pub use shape::{Shape, checked_multiply_shape, multiply_shape};
pub use tensor::Tensor;
pub use timing::{Phase, PhaseTimers, TimingSnapshot};
