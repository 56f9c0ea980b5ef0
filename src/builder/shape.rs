use crate::error::ShapeError;

// Shape rules shared by the builder (to size new values) and the verifier
// (to re-check existing instructions). Both call sites go through these
// functions, so they cannot drift apart.

// 4-d activation layout: batch, height, width, channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeNHWC {
    pub n: usize,
    pub h: usize,
    pub w: usize,
    pub c: usize,
}

impl ShapeNHWC {
    pub fn from_dims(op: &'static str, dims: &[usize]) -> Result<Self, ShapeError> {
        match dims {
            [n, h, w, c] => Ok(Self {
                n: *n,
                h: *h,
                w: *w,
                c: *c,
            }),
            _ => Err(ShapeError::RankMismatch {
                op,
                expected: 4,
                actual: dims.to_vec(),
            }),
        }
    }
}

// Spatial output size of a convolution or pooling window:
// out = (in + 2 * pad - kernel) / stride + 1, floored.
pub fn calculate_output_dims(
    op: &'static str,
    in_h: usize,
    in_w: usize,
    pad: usize,
    kernel: usize,
    stride: usize,
) -> Result<(usize, usize), ShapeError> {
    if kernel == 0 {
        return Err(ShapeError::ZeroKernel { op });
    }
    if in_h < kernel || in_w < kernel {
        return Err(ShapeError::KernelTooLarge {
            op,
            kernel,
            height: in_h,
            width: in_w,
        });
    }
    if stride == 0 {
        return Err(ShapeError::ZeroStride { op });
    }

    let window = |input: usize| {
        pad.checked_mul(2)
            .and_then(|padding| input.checked_add(padding))
            .map(|padded| (padded - kernel) / stride + 1)
            .ok_or(ShapeError::Overflow { op })
    };
    Ok((window(in_h)?, window(in_w)?))
}

// Element count of `dims`, or None if it does not fit in usize
pub fn checked_product(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

// Collapse every dim after the first: [B, d1, d2, ...] -> (B, d1 * d2 * ...)
pub fn flatten_cdr(op: &'static str, dims: &[usize]) -> Result<(usize, usize), ShapeError> {
    let (first, rest) = dims.split_first().ok_or(ShapeError::ScalarInput { op })?;
    let inner = checked_product(rest).ok_or(ShapeError::Overflow { op })?;
    Ok((*first, inner))
}

pub fn transpose_dims(dims: &[usize], shuffle: &[usize]) -> Result<Vec<usize>, ShapeError> {
    let mut seen = vec![false; dims.len()];
    let valid = shuffle.len() == dims.len()
        && shuffle.iter().all(|&axis| {
            axis < dims.len() && !std::mem::replace(&mut seen[axis], true)
        });
    if !valid {
        return Err(ShapeError::InvalidPermutation {
            shuffle: shuffle.to_vec(),
            rank: dims.len(),
        });
    }

    Ok(shuffle.iter().map(|&axis| dims[axis]).collect())
}

// Stacking n equally shaped inputs along `axis` multiplies that dim by n
pub fn concat_dims(inputs: &[&[usize]], axis: usize) -> Result<Vec<usize>, ShapeError> {
    let first = inputs.first().ok_or(ShapeError::EmptyConcat)?;

    for (index, dims) in inputs.iter().enumerate().skip(1) {
        if dims != first {
            return Err(ShapeError::ConcatInputMismatch {
                index,
                expected: first.to_vec(),
                actual: dims.to_vec(),
            });
        }
    }

    if axis >= first.len() {
        return Err(ShapeError::AxisOutOfRange {
            op: "concat",
            axis,
            rank: first.len(),
        });
    }

    let mut shape = first.to_vec();
    shape[axis] = shape[axis]
        .checked_mul(inputs.len())
        .ok_or(ShapeError::Overflow { op: "concat" })?;
    Ok(shape)
}

pub fn check_reshape(from: &[usize], to: &[usize]) -> Result<(), ShapeError> {
    let overflow = ShapeError::Overflow { op: "reshape" };
    let from_size = checked_product(from).ok_or_else(|| overflow.clone())?;
    let to_size = checked_product(to).ok_or(overflow)?;
    if from_size != to_size {
        return Err(ShapeError::ReshapeSizeMismatch {
            from: from.to_vec(),
            from_size,
            to: to.to_vec(),
            to_size,
        });
    }
    Ok(())
}

// Number of channels normalized over, as seen on `dims[channel_idx]`
pub fn channel_count(dims: &[usize], channel_idx: usize) -> Result<usize, ShapeError> {
    dims.get(channel_idx)
        .copied()
        .ok_or(ShapeError::AxisOutOfRange {
            op: "batchnormalization",
            axis: channel_idx,
            rank: dims.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_padding_keeps_spatial_size() {
        assert_eq!(
            calculate_output_dims("convolution", 32, 32, 2, 5, 1),
            Ok((32, 32))
        );
    }

    #[test]
    fn stride_floors_the_output() {
        assert_eq!(calculate_output_dims("pool", 32, 32, 0, 2, 2), Ok((16, 16)));
        assert_eq!(calculate_output_dims("pool", 7, 9, 0, 3, 2), Ok((3, 4)));
    }

    #[test]
    fn kernel_must_fit_the_input() {
        let err = calculate_output_dims("pool", 4, 8, 10, 5, 1).unwrap_err();
        assert_eq!(
            err,
            ShapeError::KernelTooLarge {
                op: "pool",
                kernel: 5,
                height: 4,
                width: 8,
            }
        );
        assert_eq!(
            calculate_output_dims("pool", 4, 4, 0, 2, 0),
            Err(ShapeError::ZeroStride { op: "pool" })
        );
        assert_eq!(
            calculate_output_dims("pool", 4, 4, 0, 0, 1),
            Err(ShapeError::ZeroKernel { op: "pool" })
        );
    }

    #[test]
    fn huge_padding_overflows() {
        assert_eq!(
            calculate_output_dims("convolution", 8, 8, usize::MAX / 2 + 1, 3, 1),
            Err(ShapeError::Overflow { op: "convolution" })
        );
        assert_eq!(
            calculate_output_dims("convolution", 8, 8, usize::MAX / 2, 3, 1),
            Err(ShapeError::Overflow { op: "convolution" })
        );
    }

    #[test]
    fn flatten_collapses_trailing_dims() {
        assert_eq!(flatten_cdr("fc", &[8, 4, 4, 3]), Ok((8, 48)));
        assert_eq!(flatten_cdr("fc", &[8]), Ok((8, 1)));
        assert_eq!(flatten_cdr("fc", &[]), Err(ShapeError::ScalarInput { op: "fc" }));
        assert_eq!(
            flatten_cdr("fc", &[2, usize::MAX, 2]),
            Err(ShapeError::Overflow { op: "fc" })
        );
    }

    #[test]
    fn transpose_rejects_non_permutations() {
        assert_eq!(
            transpose_dims(&[1, 2, 3, 4], &[0, 3, 1, 2]),
            Ok(vec![1, 4, 2, 3])
        );
        assert!(transpose_dims(&[1, 2, 3], &[0, 0, 1]).is_err());
        assert!(transpose_dims(&[1, 2, 3], &[0, 1]).is_err());
        assert!(transpose_dims(&[1, 2, 3], &[0, 1, 3]).is_err());
    }

    #[test]
    fn concat_scales_the_axis() {
        let a: &[usize] = &[2, 3];
        let b: &[usize] = &[2, 4];
        assert_eq!(concat_dims(&[a, a, a], 1), Ok(vec![2, 9]));
        assert_eq!(concat_dims(&[], 0), Err(ShapeError::EmptyConcat));
        assert!(matches!(
            concat_dims(&[a, b], 1),
            Err(ShapeError::ConcatInputMismatch { index: 1, .. })
        ));
        assert!(matches!(
            concat_dims(&[a, a], 2),
            Err(ShapeError::AxisOutOfRange { axis: 2, rank: 2, .. })
        ));
    }

    #[test]
    fn reshape_preserves_element_count() {
        assert!(check_reshape(&[1, 16, 16, 3], &[1, 768]).is_ok());
        assert!(check_reshape(&[], &[1, 1]).is_ok());
        assert!(check_reshape(&[4, 4], &[4, 5]).is_err());
        assert_eq!(
            check_reshape(&[4], &[usize::MAX, 2]),
            Err(ShapeError::Overflow { op: "reshape" })
        );
    }

    #[test]
    fn concat_of_huge_axis_overflows() {
        let a: &[usize] = &[usize::MAX / 2 + 1, 3];
        assert_eq!(
            concat_dims(&[a, a], 0),
            Err(ShapeError::Overflow { op: "concat" })
        );
        assert_eq!(concat_dims(&[a], 0), Ok(a.to_vec()));
    }
}
