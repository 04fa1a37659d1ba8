//! Dimension helpers for flat NCHW tensors.

/// Ordered dimension sizes of a tensor.
///
/// The meaning of each position is fixed by the tensor's role: `[N, C, H, W]`
/// for inputs and outputs, `[D, C, Hk, Wk]` for kernels and `[D]` for bias.
pub type Shape = Vec<usize>;

/// Number of elements described by `shape`. The empty shape is a scalar.
#[inline]
pub fn multiply_shape(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Like [`multiply_shape`], but `None` when the element count overflows `usize`.
pub fn checked_multiply_shape(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiply_shape() {
        assert_eq!(multiply_shape(&[2, 3, 4, 5]), 120);
        assert_eq!(multiply_shape(&[7]), 7);
        assert_eq!(multiply_shape(&[1, 0, 4]), 0);
    }

    #[test]
    fn test_multiply_empty_shape() {
        assert_eq!(multiply_shape(&[]), 1);
    }

    #[test]
    fn test_checked_multiply_shape() {
        assert_eq!(checked_multiply_shape(&[2, 3, 4, 5]), Some(120));
        assert_eq!(checked_multiply_shape(&[]), Some(1));
        assert_eq!(checked_multiply_shape(&[usize::MAX, 2]), None);
        assert_eq!(checked_multiply_shape(&[usize::MAX, 0]), Some(0));
    }
}
