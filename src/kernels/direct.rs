//! im2col + register-blocked GEMM convolution.
//!
//! Per batch element and group the input patches are unrolled into a
//! `[K, P]` column matrix (`K = C/G * Hk * Wk`, `P = Ho * Wo`) and multiplied
//! by the packed `[D/G, K]` weight matrix in `MR x NR` tiles.
//!
//! Phases recorded:
//!
//! | phase | work |
//! |---|---|
//! | `TotalConv` | the whole call |
//! | `PreconvPacking` | weight packing, once per call |
//! | `ConvPacking` | im2col, once per batch element and group |
//! | `ConvTiling` | the tile loop, once per batch element and group |
//! | `ConvMicrokernel` | one `MR x NR` tile product |
//! | `ConvUnpacking` | tile accumulators into the staging matrix |
//! | `PostconvUnpacking` | staging matrix plus bias into the NCHW output |

use super::{ConvDims, ConvOperands};
use crate::tensor::Tensor;
use crate::timing::{Phase, PhaseTimers};

/// Rows (output channels) per tile.
const MR: usize = 4;
/// Columns (output pixels) per tile.
const NR: usize = 8;

/// Blocked GEMM convolution; the implementation under study.
pub fn conv2d_direct(
    operands: &ConvOperands<'_>,
    output: &mut Tensor,
    timers: &mut PhaseTimers,
) {
    timers.start(Phase::TotalConv);

    let dims = ConvDims::new(operands, output);
    let depth = dims.channels_per_group * dims.kernel_h * dims.kernel_w;
    let pixels = dims.out_h * dims.out_w;

    timers.start(Phase::PreconvPacking);
    let weights = pack_weights(&dims, operands.kernel.data(), depth);
    timers.update(Phase::PreconvPacking, true);

    let mut columns = vec![0.0f32; depth * pixels];
    let mut staging = vec![0.0f32; dims.outputs_per_group * pixels];
    let bias = operands.bias.data();
    let out = output.data_mut();

    for n in 0..dims.batch {
        for g in 0..dims.groups {
            timers.start(Phase::ConvPacking);
            im2col(&dims, operands, n, g, &mut columns);
            timers.update(Phase::ConvPacking, true);

            let group_len = dims.outputs_per_group * depth;
            let group_weights = &weights[g * group_len..][..group_len];

            timers.start(Phase::ConvTiling);
            for m0 in (0..dims.outputs_per_group).step_by(MR) {
                let rows = MR.min(dims.outputs_per_group - m0);
                for p0 in (0..pixels).step_by(NR) {
                    let cols = NR.min(pixels - p0);
                    let mut acc = [[0.0f32; NR]; MR];

                    timers.start(Phase::ConvMicrokernel);
                    microkernel(
                        &group_weights[m0 * depth..],
                        &columns,
                        depth,
                        pixels,
                        p0,
                        rows,
                        cols,
                        &mut acc,
                    );
                    timers.update(Phase::ConvMicrokernel, true);

                    timers.start(Phase::ConvUnpacking);
                    for (i, acc_row) in acc.iter().enumerate().take(rows) {
                        let dst = &mut staging[(m0 + i) * pixels + p0..][..cols];
                        dst.copy_from_slice(&acc_row[..cols]);
                    }
                    timers.update(Phase::ConvUnpacking, true);
                }
            }
            timers.update(Phase::ConvTiling, true);

            timers.start(Phase::PostconvUnpacking);
            for oc in 0..dims.outputs_per_group {
                let o = g * dims.outputs_per_group + oc;
                let base = dims.output_index(n, o, 0, 0);
                let src = &staging[oc * pixels..][..pixels];
                for (dst, &value) in out[base..base + pixels].iter_mut().zip(src) {
                    *dst = value + bias[o];
                }
            }
            timers.update(Phase::PostconvUnpacking, true);
        }
    }

    timers.update(Phase::TotalConv, true);
}

/// Copies the kernel into `[G][D/G][K]` row-major order, dropping the kernel
/// channels past `C/G`.
fn pack_weights(dims: &ConvDims, kernel: &[f32], depth: usize) -> Vec<f32> {
    let mut packed = Vec::with_capacity(dims.out_channels * depth);
    for o in 0..dims.out_channels {
        for ic in 0..dims.channels_per_group {
            let start = dims.kernel_index(o, ic, 0, 0);
            packed.extend_from_slice(&kernel[start..start + dims.kernel_h * dims.kernel_w]);
        }
    }
    packed
}

/// Unrolls the receptive fields of batch element `n`, group `g` into `columns`.
fn im2col(
    dims: &ConvDims,
    operands: &ConvOperands<'_>,
    n: usize,
    g: usize,
    columns: &mut [f32],
) {
    let geometry = operands.geometry;
    let input = operands.input.data();
    let pixels = dims.out_h * dims.out_w;

    for ic in 0..dims.channels_per_group {
        let c = g * dims.channels_per_group + ic;
        for kh in 0..dims.kernel_h {
            for kw in 0..dims.kernel_w {
                let row = (ic * dims.kernel_h + kh) * dims.kernel_w + kw;
                let dst = &mut columns[row * pixels..][..pixels];
                for oh in 0..dims.out_h {
                    let ih = ConvDims::source_coord(
                        oh,
                        kh,
                        geometry.strides[0],
                        geometry.dilation[0],
                        geometry.padding[0],
                        dims.in_h,
                    );
                    for ow in 0..dims.out_w {
                        let iw = ConvDims::source_coord(
                            ow,
                            kw,
                            geometry.strides[1],
                            geometry.dilation[1],
                            geometry.padding[2],
                            dims.in_w,
                        );
                        dst[oh * dims.out_w + ow] = match (ih, iw) {
                            (Some(ih), Some(iw)) => input[dims.input_index(n, c, ih, iw)],
                            _ => 0.0,
                        };
                    }
                }
            }
        }
    }
}

/// `acc[i][j] = sum_k weights[i][k] * columns[k][p0 + j]` for the valid
/// `rows x cols` corner of the tile.
#[inline(always)]
#[allow(clippy::too_many_arguments)]
fn microkernel(
    weights: &[f32],
    columns: &[f32],
    depth: usize,
    pixels: usize,
    p0: usize,
    rows: usize,
    cols: usize,
    acc: &mut [[f32; NR]; MR],
) {
    for k in 0..depth {
        let b = &columns[k * pixels + p0..][..cols];
        for (i, acc_row) in acc.iter_mut().enumerate().take(rows) {
            let a = weights[i * depth + k];
            for (acc_value, &b_value) in acc_row.iter_mut().zip(b) {
                *acc_value = a.mul_add(b_value, *acc_value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::ConvGeometry;
    use crate::kernels::test_data::Problem;

    #[test]
    fn test_records_every_phase() {
        let problem = Problem::new([2, 2, 6, 6], 6, [3, 3], ConvGeometry::default());
        let mut timers = PhaseTimers::new();
        problem.run(conv2d_direct, &mut timers);

        // 2 batch elements x 1 group, 6 channels -> 2 row tiles, 16 pixels -> 2 column tiles
        assert_eq!(timers.reading(Phase::TotalConv).count, 1);
        assert_eq!(timers.reading(Phase::PreconvPacking).count, 1);
        assert_eq!(timers.reading(Phase::ConvPacking).count, 2);
        assert_eq!(timers.reading(Phase::ConvTiling).count, 2);
        assert_eq!(timers.reading(Phase::ConvMicrokernel).count, 8);
        assert_eq!(timers.reading(Phase::ConvUnpacking).count, 8);
        assert_eq!(timers.reading(Phase::PostconvUnpacking).count, 2);
        assert_eq!(timers.reading(Phase::TotalOperation).count, 0);
    }

    #[test]
    fn test_tile_edges() {
        // 5 output channels and 3x3 = 9 pixels leave ragged tiles on both axes.
        let problem = Problem::new([1, 1, 5, 5], 5, [3, 3], ConvGeometry::default());
        let mut timers = PhaseTimers::disabled();
        let direct = problem.run(conv2d_direct, &mut timers);
        let baseline = problem.run(crate::kernels::conv2d_baseline, &mut timers);
        assert!(direct.abs_diff_sum(&baseline) < 1e-3);
    }

    #[test]
    fn test_pack_weights_drops_extra_channels() {
        // groups = 2 over 2 input channels: each output keeps its first kernel plane.
        let input = Tensor::zeros(vec![1, 2, 1, 1]);
        let kernel = Tensor::from_vec(vec![2, 2, 1, 1], vec![1.0, 9.0, 2.0, 9.0]).unwrap();
        let bias = Tensor::zeros(vec![2]);
        let geometry = ConvGeometry {
            groups: 2,
            ..ConvGeometry::default()
        };
        let operands = ConvOperands {
            input: &input,
            kernel: &kernel,
            bias: &bias,
            geometry: &geometry,
        };
        let output = Tensor::zeros(vec![1, 2, 1, 1]);
        let dims = ConvDims::new(&operands, &output);
        assert_eq!(pack_weights(&dims, kernel.data(), 1), vec![1.0, 2.0]);
    }
}
