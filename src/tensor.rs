//! Flat tensor buffers paired with their shape.

use crate::shape::{Shape, multiply_shape};

/// A contiguous `f32` buffer together with the shape it represents.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: Vec<f32>,
    shape: Shape,
}

impl Tensor {
    /// Creates a zero-filled tensor of the given shape.
    pub fn zeros(shape: Shape) -> Self {
        let len = multiply_shape(&shape);
        Self {
            data: vec![0.0; len],
            shape,
        }
    }

    /// Builds a tensor from its elements produced by `fill`, called once per element.
    pub fn from_fn<F>(shape: Shape, mut fill: F) -> Self
    where
        F: FnMut() -> f32,
    {
        let len = multiply_shape(&shape);
        let data = (0..len).map(|_| fill()).collect();
        Self { data, shape }
    }

    /// Wraps an existing buffer. Returns `None` when the buffer length does not
    /// match the shape's element count.
    pub fn from_vec(shape: Shape, data: Vec<f32>) -> Option<Self> {
        if data.len() != multiply_shape(&shape) {
            return None;
        }
        Some(Self { data, shape })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sum of absolute elementwise differences, accumulated in `f64`.
    ///
    /// Elements past the shorter buffer are ignored; callers compare tensors of
    /// identical shape.
    pub fn abs_diff_sum(&self, other: &Tensor) -> f64 {
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| (a as f64 - b as f64).abs())
            .sum()
    }
}
