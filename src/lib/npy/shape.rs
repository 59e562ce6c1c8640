use crate::error::{NpyError, Result};

/// A validated, borrowed array shape. The first extent is the outermost
/// dimension, the last one varies fastest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shape<'a> {
    dims: &'a [u64],
}

impl<'a> Shape<'a> {
    /// rejects rank 0
    pub fn new(dims: &'a [u64]) -> Result<Shape<'a>> {
        if dims.is_empty() {
            return Err(NpyError::EmptyShape);
        }
        Ok(Shape { dims })
    }

    /// extents, outermost first
    pub fn dims(&self) -> &'a [u64] {
        self.dims
    }

    /// number of dimensions
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// product of the extents
    pub fn num_elements(&self) -> Result<usize> {
        self.dims.iter().try_fold(1usize, |acc, &d| {
            to_usize(d).and_then(|d| acc.checked_mul(d).ok_or(NpyError::Overflow))
        })
    }

    /// payload size in bytes for elements of `width` bytes
    pub fn num_bytes(&self, width: usize) -> Result<usize> {
        self.num_elements()?.checked_mul(width).ok_or(NpyError::Overflow)
    }

    /// byte strides of the dense row-major layout
    pub fn row_major_strides(&self, width: usize) -> Result<Vec<usize>> {
        let mut strides = vec![0; self.rank()];
        let mut step = width;
        for (i, &d) in self.dims.iter().enumerate().rev() {
            strides[i] = step;
            step = step.checked_mul(to_usize(d)?).ok_or(NpyError::Overflow)?;
        }
        Ok(strides)
    }
}

pub(crate) fn to_usize(d: u64) -> Result<usize> {
    if d > usize::max_value() as u64 {
        return Err(NpyError::Overflow);
    }
    Ok(d as usize)
}
