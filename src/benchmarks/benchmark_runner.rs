//! Core benchmark execution logic.

use super::benchmark_types::{HarnessConfig, RunStrategy, SpecReport};
use super::conv_setup::ConvSetup;
use crate::catalog::ConvCatalog;
use crate::data_generator::{DataGenerator, DataStrategy};
use crate::errors::{BenchError, BenchResult};
use crate::kernels::{ConvKernel, KernelPair};
use crate::tensor::Tensor;
use crate::timing::{Phase, PhaseTimers};
use log::{debug, info, warn};
use std::env;
use std::fs;
use std::io::Write;

/// Default location of the harness configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "configs/convbench.json";
/// Environment variable overriding [`DEFAULT_CONFIG_PATH`].
pub const CONFIG_PATH_ENV: &str = "CONVBENCH_CONFIG";

/// Configuration loader that handles JSON files with fallbacks
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a configuration file with fallback to defaults
    pub fn load_config<T: serde::de::DeserializeOwned + Default>(
        path: &str,
        config_name: &str,
    ) -> BenchResult<T> {
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| BenchError::ConfigParse {
                path: path.to_string(),
                source: e,
            }),
            Err(_) => {
                warn!(
                    "Config file '{}' not found, using default configuration for {}",
                    path, config_name
                );
                Ok(T::default())
            }
        }
    }

    /// Load and validate the harness configuration.
    pub fn load_harness_config() -> BenchResult<HarnessConfig> {
        let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let config: HarnessConfig = Self::load_config(&path, "convbench")?;
        config.validate()?;
        Ok(config)
    }
}

/// Runs every catalog spec through the selected strategy.
///
/// Each spec goes through the same steps: timers are reset and the data
/// distribution re-parameterized, tensors are synthesized, the kernel(s) run,
/// and the result is written to the output stream.
pub struct ConvBench {
    catalog: ConvCatalog,
    kernels: KernelPair,
    config: HarnessConfig,
    timers: PhaseTimers,
    generator: DataGenerator,
}

impl ConvBench {
    pub fn new(
        catalog: ConvCatalog,
        kernels: KernelPair,
        config: HarnessConfig,
    ) -> BenchResult<Self> {
        config.validate()?;
        let generator = match config.seed {
            Some(seed) => DataGenerator::with_seed(seed),
            None => DataGenerator::new(),
        };
        Ok(Self {
            catalog,
            kernels,
            timers: PhaseTimers::with_enabled(config.enable_timing),
            config,
            generator,
        })
    }

    pub fn catalog(&self) -> &ConvCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Timer state left by the most recent spec.
    pub fn timers(&self) -> &PhaseTimers {
        &self.timers
    }

    /// Executes every spec in catalog order, writing results to `out`.
    ///
    /// Timed strategies write the timing CSV header before the first row when
    /// timing is enabled; correctness writes one `for conv DIFF:` line per
    /// spec. The first failing spec aborts the run.
    pub fn run<W: Write>(
        &mut self,
        data_strategy: DataStrategy,
        run_strategy: RunStrategy,
        out: &mut W,
    ) -> BenchResult<Vec<SpecReport>> {
        info!(
            "Running {} convolution specs (data: {}, strategy: {})",
            self.catalog.len(),
            data_strategy.name(),
            run_strategy.name()
        );

        let mut reports = Vec::with_capacity(self.catalog.len());
        for index in 0..self.catalog.len() {
            let report = self.run_spec(index, data_strategy, run_strategy)?;
            self.emit(index, &report, out)?;
            reports.push(report);
        }

        out.flush()?;
        info!("Benchmark complete");
        Ok(reports)
    }

    fn run_spec(
        &mut self,
        index: usize,
        data_strategy: DataStrategy,
        run_strategy: RunStrategy,
    ) -> BenchResult<SpecReport> {
        let spec = &self.catalog.specs()[index];
        debug!("Executing conv {} ('{}')", index + 1, spec.label());

        self.timers.reset();
        let params = self.config.distribution;
        self.generator.reset_distribution(params.mean, params.std_dev)?;

        let mut setup = ConvSetup::build(spec, &mut self.generator, data_strategy)?;

        let report = match run_strategy {
            RunStrategy::Direct => {
                debug!("exec direct conv");
                self.timed_run(self.kernels.direct, &mut setup)
            }
            RunStrategy::Baseline => {
                debug!("exec baseline conv");
                self.timed_run(self.kernels.baseline, &mut setup)
            }
            RunStrategy::Correctness => {
                debug!("verifying correctness");
                let diff = self.compare_kernels(&mut setup);
                SpecReport::Correctness { diff }
            }
        };
        Ok(report)
    }

    fn timed_run(&mut self, kernel: ConvKernel, setup: &mut ConvSetup) -> SpecReport {
        let (operands, output) = setup.split();
        self.timers.start(Phase::TotalOperation);
        kernel(&operands, output, &mut self.timers);
        self.timers.update(Phase::TotalOperation, true);
        SpecReport::Timing(self.timers.snapshot())
    }

    /// Runs direct into the setup's output and baseline into a fresh zeroed
    /// buffer, then sums the absolute differences. No timing is recorded.
    fn compare_kernels(&self, setup: &mut ConvSetup) -> f64 {
        let mut untimed = PhaseTimers::disabled();
        let mut reference = Tensor::zeros(setup.output.shape().to_vec());

        let (operands, output) = setup.split();
        (self.kernels.direct)(&operands, output, &mut untimed);
        (self.kernels.baseline)(&operands, &mut reference, &mut untimed);

        setup.output.abs_diff_sum(&reference)
    }

    fn emit<W: Write>(&self, index: usize, report: &SpecReport, out: &mut W) -> BenchResult<()> {
        match report {
            SpecReport::Timing(snapshot) => {
                if self.config.enable_timing {
                    if index == 0 {
                        writeln!(out, "{}", PhaseTimers::render_header())?;
                    }
                    writeln!(out, "{}", snapshot.render_row())?;
                }
            }
            SpecReport::Correctness { diff } => {
                writeln!(out, "for conv DIFF: {:.6}", diff)?;
            }
        }
        Ok(())
    }
}
