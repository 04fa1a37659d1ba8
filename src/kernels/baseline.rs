//! Reference convolution: one nested loop per dimension, no blocking.

use super::{ConvDims, ConvOperands};
use crate::tensor::Tensor;
use crate::timing::PhaseTimers;

/// Straightforward grouped 2D convolution used as the correctness reference.
///
/// Writes every element of `output`; it does not touch the phase timers.
pub fn conv2d_baseline(
    operands: &ConvOperands<'_>,
    output: &mut Tensor,
    _timers: &mut PhaseTimers,
) {
    let dims = ConvDims::new(operands, output);
    let geometry = operands.geometry;
    let [stride_h, stride_w] = geometry.strides;
    let [dilation_h, dilation_w] = geometry.dilation;
    let pad_top = geometry.padding[0];
    let pad_left = geometry.padding[2];

    let input = operands.input.data();
    let kernel = operands.kernel.data();
    let bias = operands.bias.data();
    let out = output.data_mut();

    for n in 0..dims.batch {
        for g in 0..dims.groups {
            for oc in 0..dims.outputs_per_group {
                let o = g * dims.outputs_per_group + oc;
                for oh in 0..dims.out_h {
                    for ow in 0..dims.out_w {
                        let mut sum = bias[o];
                        for ic in 0..dims.channels_per_group {
                            let c = g * dims.channels_per_group + ic;
                            for kh in 0..dims.kernel_h {
                                let Some(ih) = ConvDims::source_coord(
                                    oh, kh, stride_h, dilation_h, pad_top, dims.in_h,
                                ) else {
                                    continue;
                                };
                                for kw in 0..dims.kernel_w {
                                    let Some(iw) = ConvDims::source_coord(
                                        ow, kw, stride_w, dilation_w, pad_left, dims.in_w,
                                    ) else {
                                        continue;
                                    };
                                    sum += input[dims.input_index(n, c, ih, iw)]
                                        * kernel[dims.kernel_index(o, ic, kh, kw)];
                                }
                            }
                        }
                        out[dims.output_index(n, o, oh, ow)] = sum;
                    }
                }
            }
        }
    }
}
