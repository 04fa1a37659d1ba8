//! Convolution kernel contract and the two shipped implementations.
//!
//! A kernel is a plain function value: it reads the operands, writes every
//! element of the output tensor in place and may attribute time to
//! sub-steps through the [`PhaseTimers`] registry it is handed.
//!
//! Layout conventions shared by every kernel:
//!
//! * input `[N, C, H, W]`, output `[N, D, Ho, Wo]`, bias `[D]`;
//! * kernel `[D, C, Hk, Wk]`; with `G` groups each output channel reads the
//!   first `C / G` input-channel planes of its kernel slice;
//! * output channel `o` belongs to group `o / (D / G)` and convolves input
//!   channels `g * (C / G) .. (g + 1) * (C / G)`;
//! * input coordinates outside the image (padding) read as zero.

pub mod baseline;
pub mod direct;

pub use baseline::conv2d_baseline;
pub use direct::conv2d_direct;

use crate::tensor::Tensor;
use crate::timing::PhaseTimers;

/// Stride, padding, dilation and group count of one convolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvGeometry {
    /// `[vertical, horizontal]`.
    pub strides: [usize; 2],
    /// `[top, bottom, left, right]`.
    pub padding: [usize; 4],
    /// `[vertical, horizontal]`.
    pub dilation: [usize; 2],
    pub groups: usize,
}

impl Default for ConvGeometry {
    fn default() -> Self {
        Self {
            strides: [1, 1],
            padding: [0, 0, 0, 0],
            dilation: [1, 1],
            groups: 1,
        }
    }
}

/// Read-only operands of a convolution call.
#[derive(Debug, Clone, Copy)]
pub struct ConvOperands<'a> {
    pub input: &'a Tensor,
    pub kernel: &'a Tensor,
    pub bias: &'a Tensor,
    pub geometry: &'a ConvGeometry,
}

/// Signature every convolution implementation satisfies.
pub type ConvKernel = fn(&ConvOperands<'_>, &mut Tensor, &mut PhaseTimers);

/// The implementation under study and the trusted reference it is checked against.
#[derive(Debug, Clone, Copy)]
pub struct KernelPair {
    pub direct: ConvKernel,
    pub baseline: ConvKernel,
}

impl KernelPair {
    pub fn new(direct: ConvKernel, baseline: ConvKernel) -> Self {
        Self { direct, baseline }
    }
}

impl Default for KernelPair {
    fn default() -> Self {
        Self::new(conv2d_direct, conv2d_baseline)
    }
}

/// Output extent along one spatial axis.
///
/// Returns `Some(0)` when the dilated kernel does not fit the padded input or
/// the stride is zero, and `None` when the padded input or the dilated kernel
/// span does not fit in `usize`.
pub fn output_extent(
    input: usize,
    kernel: usize,
    stride: usize,
    pad_begin: usize,
    pad_end: usize,
    dilation: usize,
) -> Option<usize> {
    if stride == 0 || kernel == 0 {
        return Some(0);
    }
    let padded = input.checked_add(pad_begin)?.checked_add(pad_end)?;
    let span = dilation.checked_mul(kernel - 1)?.checked_add(1)?;
    if padded < span {
        return Some(0);
    }
    Some((padded - span) / stride + 1)
}

/// Dimensions of one convolution call, unpacked from tensor shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ConvDims {
    pub batch: usize,
    pub in_channels: usize,
    pub in_h: usize,
    pub in_w: usize,
    pub out_channels: usize,
    pub out_h: usize,
    pub out_w: usize,
    /// Input-channel extent of the kernel tensor (its second dimension).
    pub kernel_channels: usize,
    pub kernel_h: usize,
    pub kernel_w: usize,
    pub groups: usize,
    pub channels_per_group: usize,
    pub outputs_per_group: usize,
}

impl ConvDims {
    pub(crate) fn new(operands: &ConvOperands<'_>, output: &Tensor) -> Self {
        let input = operands.input.shape();
        let kernel = operands.kernel.shape();
        let out = output.shape();
        let groups = operands.geometry.groups.max(1);
        Self {
            batch: input[0],
            in_channels: input[1],
            in_h: input[2],
            in_w: input[3],
            out_channels: out[1],
            out_h: out[2],
            out_w: out[3],
            kernel_channels: kernel[1],
            kernel_h: kernel[2],
            kernel_w: kernel[3],
            groups,
            channels_per_group: input[1] / groups,
            outputs_per_group: out[1] / groups,
        }
    }

    #[inline(always)]
    pub(crate) fn input_index(&self, n: usize, c: usize, h: usize, w: usize) -> usize {
        ((n * self.in_channels + c) * self.in_h + h) * self.in_w + w
    }

    #[inline(always)]
    pub(crate) fn kernel_index(&self, o: usize, c: usize, kh: usize, kw: usize) -> usize {
        ((o * self.kernel_channels + c) * self.kernel_h + kh) * self.kernel_w + kw
    }

    #[inline(always)]
    pub(crate) fn output_index(&self, n: usize, o: usize, h: usize, w: usize) -> usize {
        ((n * self.out_channels + o) * self.out_h + h) * self.out_w + w
    }

    /// Input coordinate read by output position `out` and kernel tap `tap`,
    /// or `None` when it falls into the padding or past `usize::MAX`.
    #[inline(always)]
    pub(crate) fn source_coord(
        out: usize,
        tap: usize,
        stride: usize,
        dilation: usize,
        pad: usize,
        extent: usize,
    ) -> Option<usize> {
        let coord = out
            .checked_mul(stride)?
            .checked_add(tap.checked_mul(dilation)?)?
            .checked_sub(pad)?;
        (coord < extent).then_some(coord)
    }
}

#[cfg(test)]
pub(crate) mod test_data {
    use super::*;

    /// Deterministic, sign-varying values so kernels see non-trivial data.
    pub(crate) fn tensor(shape: Vec<usize>, salt: f32) -> Tensor {
        let mut i = 0.0f32;
        Tensor::from_fn(shape, || {
            i += 1.0;
            (i * 0.37 + salt).sin()
        })
    }

    pub(crate) struct Problem {
        pub input: Tensor,
        pub kernel: Tensor,
        pub bias: Tensor,
        pub geometry: ConvGeometry,
        pub output_shape: Vec<usize>,
    }

    impl Problem {
        pub(crate) fn new(
            input_shape: [usize; 4],
            out_channels: usize,
            kernel_hw: [usize; 2],
            geometry: ConvGeometry,
        ) -> Self {
            let [n, c, h, w] = input_shape;
            let out_h = output_extent(
                h,
                kernel_hw[0],
                geometry.strides[0],
                geometry.padding[0],
                geometry.padding[1],
                geometry.dilation[0],
            )
            .expect("test extents fit in usize");
            let out_w = output_extent(
                w,
                kernel_hw[1],
                geometry.strides[1],
                geometry.padding[2],
                geometry.padding[3],
                geometry.dilation[1],
            )
            .expect("test extents fit in usize");
            Self {
                input: tensor(input_shape.to_vec(), 0.1),
                kernel: tensor(vec![out_channels, c, kernel_hw[0], kernel_hw[1]], 0.7),
                bias: tensor(vec![out_channels], 1.3),
                geometry,
                output_shape: vec![n, out_channels, out_h, out_w],
            }
        }

        pub(crate) fn run(&self, kernel: ConvKernel, timers: &mut PhaseTimers) -> Tensor {
            let operands = ConvOperands {
                input: &self.input,
                kernel: &self.kernel,
                bias: &self.bias,
                geometry: &self.geometry,
            };
            let mut output = Tensor::zeros(self.output_shape.clone());
            kernel(&operands, &mut output, timers);
            output
        }
    }
}
