//! Benchmark type definitions and configuration structures.

use crate::data_generator::DistributionParams;
use crate::errors::{BenchError, BenchResult};
use crate::timing::TimingSnapshot;
use log::debug;
use serde::{Deserialize, Serialize};

/// Which kernel(s) run for each spec and whether outputs are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStrategy {
    /// Run both kernels and report the summed absolute difference of their outputs.
    Correctness,
    /// Time the baseline kernel.
    Baseline,
    /// Time the direct kernel.
    Direct,
}

impl RunStrategy {
    /// Parses a command-line name. Unknown names fall back to `Direct`.
    pub fn from_arg(name: &str) -> Self {
        match name {
            "correctness" => RunStrategy::Correctness,
            "baseline" => RunStrategy::Baseline,
            "direct" => RunStrategy::Direct,
            other => {
                debug!(
                    "running strategy '{}' not recognized, falling back to direct",
                    other
                );
                RunStrategy::Direct
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RunStrategy::Correctness => "correctness",
            RunStrategy::Baseline => "baseline",
            RunStrategy::Direct => "direct",
        }
    }

    pub fn is_timed(&self) -> bool {
        !matches!(self, RunStrategy::Correctness)
    }
}

/// Harness-wide switches and data generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Emit step-by-step diagnostics on stderr.
    pub enable_logging: bool,
    /// Record phase timings and emit the timing CSV.
    pub enable_timing: bool,
    /// Distribution the data generator is reset to before every spec.
    pub distribution: DistributionParams,
    /// Fixed engine seed; entropy-seeded when absent.
    pub seed: Option<u64>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            enable_logging: false,
            enable_timing: true,
            distribution: DistributionParams::default(),
            seed: None,
        }
    }
}

impl HarnessConfig {
    /// Validates the configuration
    pub fn validate(&self) -> BenchResult<()> {
        if !self.distribution.mean.is_finite() {
            return Err(BenchError::ConfigValidation {
                field: "distribution.mean".to_string(),
                message: "Mean must be a finite number".to_string(),
            });
        }

        if !self.distribution.std_dev.is_finite() || self.distribution.std_dev < 0.0 {
            return Err(BenchError::ConfigValidation {
                field: "distribution.std_dev".to_string(),
                message: "Standard deviation must be finite and non-negative".to_string(),
            });
        }

        Ok(())
    }
}

/// Outcome of one catalog spec.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecReport {
    /// Phase timings after a direct or baseline run.
    Timing(TimingSnapshot),
    /// Sum of absolute differences between direct and baseline outputs.
    Correctness { diff: f64 },
}

impl SpecReport {
    pub fn timing(&self) -> Option<&TimingSnapshot> {
        match self {
            SpecReport::Timing(snapshot) => Some(snapshot),
            SpecReport::Correctness { .. } => None,
        }
    }

    pub fn diff(&self) -> Option<f64> {
        match self {
            SpecReport::Timing(_) => None,
            SpecReport::Correctness { diff } => Some(*diff),
        }
    }
}
