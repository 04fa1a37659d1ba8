//! Tensors and geometry for one catalog spec.

use crate::catalog::ConvSpec;
use crate::data_generator::{DataGenerator, DataStrategy};
use crate::errors::{BenchError, BenchResult};
use crate::kernels::{ConvGeometry, ConvOperands, output_extent};
use crate::shape::{Shape, checked_multiply_shape, multiply_shape};
use crate::tensor::Tensor;
use log::{debug, warn};

/// Everything a kernel call needs for one spec, owned for one iteration.
#[derive(Debug, Clone)]
pub struct ConvSetup {
    pub input: Tensor,
    pub kernel: Tensor,
    pub bias: Tensor,
    pub output: Tensor,
    pub geometry: ConvGeometry,
}

impl ConvSetup {
    /// Derives shapes and geometry from `spec` and synthesizes the input,
    /// kernel and bias tensors, in that order. The output starts zeroed.
    pub fn build(
        spec: &ConvSpec,
        generator: &mut DataGenerator,
        strategy: DataStrategy,
    ) -> BenchResult<Self> {
        let label = spec.label();

        let batch = spec.get("Ni")?;
        let output_batch = spec.get("No")?;
        if output_batch != batch {
            return Err(BenchError::BatchMismatch {
                label: label.to_string(),
                input: batch,
                output: output_batch,
            });
        }

        let in_channels = spec.get("Ci")?;
        let out_channels = spec.get("Do")?;
        let groups = spec.get("G")?;
        if groups == 0 || in_channels % groups != 0 || out_channels % groups != 0 {
            return Err(BenchError::InvalidGroups {
                label: label.to_string(),
                groups,
                in_channels,
                out_channels,
            });
        }

        let dim = |field: &str| -> BenchResult<usize> {
            usize::try_from(spec.get(field)?).map_err(|_| shape_overflow(label, field))
        };

        let input_shape: Shape = vec![dim("Ni")?, dim("Ci")?, dim("Hi")?, dim("Wi")?];
        let output_shape: Shape = vec![dim("No")?, dim("Do")?, dim("Ho")?, dim("Wo")?];
        let kernel_shape: Shape = vec![dim("Do")?, dim("Ci")?, dim("Hk")?, dim("Wk")?];
        let bias_shape: Shape = vec![dim("Do")?];

        let geometry = ConvGeometry {
            strides: [dim("Hs")?, dim("Ws")?],
            padding: [dim("Hpt")?, dim("Hpb")?, dim("Wpl")?, dim("Wpr")?],
            dilation: [dim("Hd")?, dim("Wd")?],
            groups: dim("G")?,
        };

        // The direct kernel unrolls [C/G * Hk * Wk, Ho * Wo] columns.
        let columns_shape = [
            input_shape[1] / geometry.groups,
            kernel_shape[2],
            kernel_shape[3],
            output_shape[2],
            output_shape[3],
        ];
        for (fields, shape) in [
            ("Ni,Ci,Hi,Wi", &input_shape[..]),
            ("No,Do,Ho,Wo", &output_shape[..]),
            ("Do,Ci,Hk,Wk", &kernel_shape[..]),
            ("Ci,G,Hk,Wk,Ho,Wo", &columns_shape[..]),
        ] {
            if tensor_len(shape).is_none() {
                return Err(shape_overflow(label, fields));
            }
        }

        check_output_extent(label, &input_shape, &output_shape, &kernel_shape, &geometry)?;

        debug!(
            "spec '{}': input {:?}, kernel {:?}, output {:?} ({} elements)",
            label,
            input_shape,
            kernel_shape,
            output_shape,
            multiply_shape(&output_shape)
        );

        let input = generator.generate(input_shape, strategy);
        let kernel = generator.generate(kernel_shape, strategy);
        let bias = generator.generate(bias_shape, strategy);
        let output = Tensor::zeros(output_shape);

        Ok(Self {
            input,
            kernel,
            bias,
            output,
            geometry,
        })
    }

    /// Splits the setup into read-only operands and the mutable output.
    pub fn split(&mut self) -> (ConvOperands<'_>, &mut Tensor) {
        (
            ConvOperands {
                input: &self.input,
                kernel: &self.kernel,
                bias: &self.bias,
                geometry: &self.geometry,
            },
            &mut self.output,
        )
    }
}

/// Element count of a tensor with `shape`, or `None` when its `f32` buffer
/// could not be allocated.
fn tensor_len(shape: &[usize]) -> Option<usize> {
    checked_multiply_shape(shape).filter(|&len| len <= isize::MAX as usize / size_of::<f32>())
}

fn shape_overflow(label: &str, field: &str) -> BenchError {
    BenchError::ShapeOverflow {
        label: label.to_string(),
        field: field.to_string(),
    }
}

/// Warns when the catalog's output extent disagrees with the geometry.
///
/// Fails when the padded input or the dilated kernel span overflows.
fn check_output_extent(
    label: &str,
    input: &[usize],
    output: &[usize],
    kernel: &[usize],
    geometry: &ConvGeometry,
) -> BenchResult<()> {
    let expected_h = output_extent(
        input[2],
        kernel[2],
        geometry.strides[0],
        geometry.padding[0],
        geometry.padding[1],
        geometry.dilation[0],
    )
    .ok_or_else(|| shape_overflow(label, "Hi,Hpt,Hpb,Hk,Hd"))?;
    let expected_w = output_extent(
        input[3],
        kernel[3],
        geometry.strides[1],
        geometry.padding[2],
        geometry.padding[3],
        geometry.dilation[1],
    )
    .ok_or_else(|| shape_overflow(label, "Wi,Wpl,Wpr,Wk,Wd"))?;
    if output[2] != expected_h || output[3] != expected_w {
        warn!(
            "spec '{}': catalog output {}x{} differs from geometry-derived {}x{}",
            label, output[2], output[3], expected_h, expected_w
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ConvCatalog;

    const HEADER: &str = "id,Ni,Ci,Hi,Wi,No,Do,Ho,Wo,Hk,Wk,Hpt,Hpb,Wpl,Wpr,Hs,Ws,Hd,Wd,G";

    fn spec(row: &str) -> ConvSpec {
        let catalog = ConvCatalog::parse(&format!("{}\n{}", HEADER, row)).unwrap();
        catalog.specs()[0].clone()
    }

    #[test]
    fn test_shapes_follow_spec_fields() {
        let spec = spec("c1,2,4,8,6,2,6,4,3,3,2,1,0,0,1,2,2,1,1,2");
        let mut generator = DataGenerator::with_seed(9);
        let setup = ConvSetup::build(&spec, &mut generator, DataStrategy::Random).unwrap();

        assert_eq!(setup.input.shape(), &[2, 4, 8, 6]);
        assert_eq!(setup.output.shape(), &[2, 6, 4, 3]);
        assert_eq!(setup.kernel.shape(), &[6, 4, 3, 2]);
        assert_eq!(setup.bias.shape(), &[6]);
        assert!(setup.output.data().iter().all(|&x| x == 0.0));
        assert_eq!(
            setup.geometry,
            ConvGeometry {
                strides: [2, 2],
                padding: [1, 0, 0, 1],
                dilation: [1, 1],
                groups: 2,
            }
        );
    }

    #[test]
    fn test_batch_mismatch_is_rejected() {
        let spec = spec("c1,2,1,4,4,1,1,1,1,4,4,0,0,0,0,1,1,1,1,1");
        let mut generator = DataGenerator::with_seed(9);
        let result = ConvSetup::build(&spec, &mut generator, DataStrategy::Random);
        assert!(matches!(
            result,
            Err(BenchError::BatchMismatch {
                input: 2,
                output: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_groups_are_rejected() {
        let mut generator = DataGenerator::with_seed(9);
        for row in [
            "c1,1,4,4,4,1,4,2,2,3,3,0,0,0,0,1,1,1,1,0",
            "c2,1,3,4,4,1,4,2,2,3,3,0,0,0,0,1,1,1,1,2",
            "c3,1,4,4,4,1,3,2,2,3,3,0,0,0,0,1,1,1,1,2",
        ] {
            let result = ConvSetup::build(&spec(row), &mut generator, DataStrategy::Random);
            assert!(
                matches!(result, Err(BenchError::InvalidGroups { .. })),
                "row {} should be rejected",
                row
            );
        }
    }

    #[test]
    fn test_oversized_rows_are_rejected() {
        let mut generator = DataGenerator::with_seed(9);
        for row in [
            // padding past usize::MAX
            "p,1,1,4,4,1,1,1,1,4,4,18446744073709551615,0,0,0,1,1,1,1,1",
            // 2^32 x 2^32 input plane
            "d,1,1,4294967296,4294967296,1,1,1,1,1,1,0,0,0,0,1,1,1,1,1",
            // dilated kernel span past usize::MAX
            "s,1,1,4,4,1,1,1,1,3,3,0,0,0,0,1,1,18446744073709551615,1,1",
            // 2^62 f32 elements cannot be allocated
            "a,1,1,4611686018427387904,1,1,1,1,1,1,1,0,0,0,0,1,1,1,1,1",
        ] {
            let result = ConvSetup::build(&spec(row), &mut generator, DataStrategy::Random);
            assert!(
                matches!(result, Err(BenchError::ShapeOverflow { .. })),
                "row {} should be rejected, got {:?}",
                row,
                result.map(|setup| setup.input.shape().to_vec())
            );
        }
    }

    #[test]
    fn test_missing_field() {
        let catalog = ConvCatalog::parse("id,Ni,No\nc1,1,1").unwrap();
        let mut generator = DataGenerator::with_seed(9);
        let result = ConvSetup::build(&catalog.specs()[0], &mut generator, DataStrategy::Random);
        assert!(matches!(result, Err(BenchError::Catalog(_))));
    }
}
