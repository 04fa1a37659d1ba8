//! Synthetic tensor data for convolution benchmarks.

use crate::errors::{GeneratorError, GeneratorResult};
use crate::shape::Shape;
use crate::tensor::Tensor;
use log::{debug, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Default mean of the sampling distribution.
pub const DEFAULT_MEAN: f32 = 0.5;
/// Default standard deviation of the sampling distribution.
pub const DEFAULT_STD_DEV: f32 = 0.5;

/// How tensor contents are synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataStrategy {
    /// Independent samples from the configured normal distribution.
    Random,
    /// Samples from caller-supplied parameters set through
    /// [`DataGenerator::reset_distribution`]; sampling is the same as `Random`.
    FollowDistribution,
    /// Loading recorded tensors. Not available; falls back to `Random`.
    Load,
}

impl DataStrategy {
    /// Parses a command-line name. Unknown names fall back to `Random`.
    ///
    /// Accepted names are `random`, `follow_dist` and `LOAD` (case-sensitive).
    pub fn from_arg(name: &str) -> Self {
        match name {
            "random" => DataStrategy::Random,
            "follow_dist" => DataStrategy::FollowDistribution,
            "LOAD" => DataStrategy::Load,
            other => {
                debug!(
                    "data strategy '{}' not recognized, falling back to random",
                    other
                );
                DataStrategy::Random
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataStrategy::Random => "random",
            DataStrategy::FollowDistribution => "follow_dist",
            DataStrategy::Load => "LOAD",
        }
    }
}

/// Parameters of the normal distribution tensors are sampled from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributionParams {
    pub mean: f32,
    pub std_dev: f32,
}

impl Default for DistributionParams {
    fn default() -> Self {
        Self {
            mean: DEFAULT_MEAN,
            std_dev: DEFAULT_STD_DEV,
        }
    }
}

/// Owns the pseudo-random engine and the current sampling distribution.
///
/// The engine is seeded once at construction. [`reset_distribution`] replaces
/// the distribution parameters without touching the engine state, so
/// successive specs keep drawing from the same random stream.
///
/// [`reset_distribution`]: DataGenerator::reset_distribution
#[derive(Debug, Clone)]
pub struct DataGenerator {
    rng: StdRng,
    params: DistributionParams,
    distribution: Normal<f32>,
}

impl DataGenerator {
    /// Creates a generator seeded from operating-system entropy.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Creates a generator with a fixed seed for reproducible data.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        let params = DistributionParams::default();
        Self {
            rng,
            params,
            distribution: standard_distribution(),
        }
    }

    pub fn params(&self) -> DistributionParams {
        self.params
    }

    /// Re-parameterizes the sampling distribution. The engine is not re-seeded.
    pub fn reset_distribution(&mut self, mean: f32, std_dev: f32) -> GeneratorResult<()> {
        if !mean.is_finite() || !std_dev.is_finite() {
            return Err(GeneratorError::InvalidDistribution { mean, std_dev });
        }
        self.distribution = Normal::new(mean, std_dev)
            .map_err(|_| GeneratorError::InvalidDistribution { mean, std_dev })?;
        self.params = DistributionParams { mean, std_dev };
        Ok(())
    }

    /// Produces a tensor of `shape` filled according to `strategy`.
    pub fn generate(&mut self, shape: Shape, strategy: DataStrategy) -> Tensor {
        match strategy {
            DataStrategy::Random | DataStrategy::FollowDistribution => self.sample(shape),
            DataStrategy::Load => {
                warn!("LOAD data strategy is not implemented, falling back to random");
                self.generate(shape, DataStrategy::Random)
            }
        }
    }

    fn sample(&mut self, shape: Shape) -> Tensor {
        let distribution = self.distribution;
        Tensor::from_fn(shape, || distribution.sample(&mut self.rng))
    }
}

impl Default for DataGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn standard_distribution() -> Normal<f32> {
    match Normal::new(DEFAULT_MEAN, DEFAULT_STD_DEV) {
        Ok(distribution) => distribution,
        Err(_) => unreachable!("default distribution parameters are valid"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::multiply_shape;

    #[test]
    fn test_generated_size_matches_shape() {
        let mut generator = DataGenerator::with_seed(7);
        let shapes: Vec<Shape> = vec![vec![1, 3, 8, 8], vec![16], vec![4, 0, 2], vec![]];
        for strategy in [
            DataStrategy::Random,
            DataStrategy::FollowDistribution,
            DataStrategy::Load,
        ] {
            for shape in &shapes {
                let tensor = generator.generate(shape.clone(), strategy);
                assert_eq!(tensor.len(), multiply_shape(shape));
                assert_eq!(tensor.shape(), shape.as_slice());
            }
        }
    }

    #[test]
    fn test_same_seed_same_data() {
        let mut a = DataGenerator::with_seed(42);
        let mut b = DataGenerator::with_seed(42);
        assert_eq!(
            a.generate(vec![2, 8], DataStrategy::Random),
            b.generate(vec![2, 8], DataStrategy::Random)
        );
    }

    #[test]
    fn test_load_falls_back_to_random() {
        let mut a = DataGenerator::with_seed(3);
        let mut b = DataGenerator::with_seed(3);
        assert_eq!(
            a.generate(vec![32], DataStrategy::Load),
            b.generate(vec![32], DataStrategy::Random)
        );
    }

    #[test]
    fn test_reset_distribution_does_not_reseed() {
        let mut generator = DataGenerator::with_seed(11);
        let first = generator.generate(vec![16], DataStrategy::Random);
        generator
            .reset_distribution(DEFAULT_MEAN, DEFAULT_STD_DEV)
            .unwrap();
        let second = generator.generate(vec![16], DataStrategy::Random);
        assert_ne!(first, second);
    }

    #[test]
    fn test_samples_follow_parameters() {
        let mut generator = DataGenerator::with_seed(5);
        generator.reset_distribution(10.0, 0.1).unwrap();
        let tensor = generator.generate(vec![10_000], DataStrategy::FollowDistribution);
        let mean = tensor.data().iter().map(|&x| x as f64).sum::<f64>() / tensor.len() as f64;
        assert!((mean - 10.0).abs() < 0.01, "sample mean {}", mean);
    }

    #[test]
    fn test_zero_std_dev_is_constant() {
        let mut generator = DataGenerator::with_seed(1);
        generator.reset_distribution(2.0, 0.0).unwrap();
        let tensor = generator.generate(vec![8], DataStrategy::Random);
        assert!(tensor.data().iter().all(|&x| x == 2.0));
    }

    #[test]
    fn test_invalid_parameters() {
        let mut generator = DataGenerator::with_seed(1);
        assert!(generator.reset_distribution(0.0, -1.0).is_err());
        assert!(generator.reset_distribution(f32::NAN, 1.0).is_err());
        assert_eq!(generator.params(), DistributionParams::default());
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(DataStrategy::from_arg("random"), DataStrategy::Random);
        assert_eq!(
            DataStrategy::from_arg("follow_dist"),
            DataStrategy::FollowDistribution
        );
        assert_eq!(DataStrategy::from_arg("LOAD"), DataStrategy::Load);
        assert_eq!(DataStrategy::from_arg("load"), DataStrategy::Random);
        assert_eq!(DataStrategy::from_arg("bogus"), DataStrategy::Random);
    }
}
