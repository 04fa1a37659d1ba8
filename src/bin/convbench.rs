//! Convolution benchmark CLI executable.
//!
//! Usage: `convbench <catalog.csv> <data strategy> <running strategy>`

use convbench::benchmarks::{ConfigLoader, ConvBench, HarnessConfig};
use convbench::errors::BenchResult;
use convbench::{ConvCatalog, DataStrategy, KernelPair, RunStrategy};
use log::{LevelFilter, error, info};
use std::env;
use std::io;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 4 {
        print_usage();
        std::process::exit(1);
    }

    init_logger();
    let config = match ConfigLoader::load_harness_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    apply_logging_switch(&config);

    if let Err(e) = run_benchmarks(&args[1], &args[2], &args[3], config) {
        error!("Benchmark execution failed: {}", e);
        std::process::exit(1);
    }
}

/// Starts logging before the configuration is read so config warnings are kept.
fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
}

/// Without `RUST_LOG`, `enable_logging = false` keeps only warnings and errors.
fn apply_logging_switch(config: &HarnessConfig) {
    if env::var_os("RUST_LOG").is_none() && !config.enable_logging {
        log::set_max_level(LevelFilter::Warn);
    }
}

fn run_benchmarks(
    catalog_path: &str,
    data_arg: &str,
    running_arg: &str,
    config: HarnessConfig,
) -> BenchResult<()> {
    info!("program begin");

    let data_strategy = DataStrategy::from_arg(data_arg);
    info!("data generation strategy: {}", data_strategy.name());
    let running_strategy = RunStrategy::from_arg(running_arg);
    info!("running strategy: {}", running_strategy.name());

    let catalog = ConvCatalog::load(catalog_path)?;
    let mut bench = ConvBench::new(catalog, KernelPair::default(), config)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    bench.run(data_strategy, running_strategy, &mut out)?;

    info!("program end");
    Ok(())
}

fn print_usage() {
    println!("This program expects three command line arguments:");
    println!("  1. CSV convolution operation set.");
    println!("  2. Data generation strategy (random|follow_dist|LOAD).");
    println!("  3. Execution strategy (correctness|direct|baseline).");
    println!();
    println!("Example:");
    println!("  cargo run --release --bin convbench -- convsets/sample.csv random direct");
}
