use std::io::{self, Write};

use crate::error::{NpyError, Result};
use crate::npy::element::MAX_ELEMENT_WIDTH;
use crate::npy::shape::{to_usize, Shape};

/// Writes `element_count` elements of `byte_width` bytes from a dense
/// row-major buffer, verbatim.
pub fn write_contiguous<W: Write + ?Sized>(
    sink: &mut W,
    data: &[u8],
    byte_width: usize,
    element_count: usize,
) -> Result<()> {
    let nbytes = contiguous_len(data, byte_width, element_count)?;
    sink.write_all(&data[..nbytes])?;
    Ok(())
}

/// Checks that `data` holds `element_count` elements and returns their size
pub(crate) fn contiguous_len(data: &[u8], byte_width: usize, element_count: usize) -> Result<usize> {
    check_width(byte_width)?;
    let nbytes = element_count.checked_mul(byte_width).ok_or(NpyError::Overflow)?;
    if nbytes > 0 && data.is_empty() {
        return Err(NpyError::MissingData);
    }
    if data.len() < nbytes {
        return Err(NpyError::OutOfBounds { needed: nbytes, len: data.len() });
    }
    Ok(nbytes)
}

/// Writes the view described by `shape` and byte `strides` in row-major
/// order, without copying it into a dense buffer first. `data` starts at
/// the first element of the view.
pub fn write_strided<W: Write + ?Sized>(
    sink: &mut W,
    data: &[u8],
    byte_width: usize,
    shape: &[u64],
    strides: &[usize],
) -> Result<()> {
    let layout = StridedLayout::new(Shape::new(shape)?, strides, byte_width)?;
    layout.check(data)?;
    layout.write_to(sink, data)
}

fn check_width(byte_width: usize) -> Result<()> {
    if byte_width == 0 || byte_width > MAX_ELEMENT_WIDTH {
        return Err(NpyError::UnsupportedWidth(byte_width));
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Dim {
    extent: usize,
    stride: usize,
}

/// A validated strided view, with adjacent dimensions merged where the
/// memory layout allows it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StridedLayout {
    dims: Vec<Dim>,
    width: usize,
    payload_len: usize,
    span: usize,
}

impl StridedLayout {
    /// fails on a stride count that differs from the rank or on overflow
    pub fn new(shape: Shape, strides: &[usize], byte_width: usize) -> Result<StridedLayout> {
        check_width(byte_width)?;
        if strides.len() != shape.rank() {
            return Err(NpyError::StrideRankMismatch { rank: shape.rank(), strides: strides.len() });
        }
        let payload_len = shape.num_bytes(byte_width)?;
        let dims = shape
            .dims()
            .iter()
            .zip(strides)
            .map(|(&d, &stride)| Ok(Dim { extent: to_usize(d)?, stride }))
            .collect::<Result<Vec<Dim>>>()?;

        if payload_len == 0 {
            return Ok(StridedLayout { dims: Vec::new(), width: byte_width, payload_len, span: 0 });
        }

        let span = dims.iter().try_fold(byte_width, |acc, dim| {
            (dim.extent - 1)
                .checked_mul(dim.stride)
                .and_then(|reach| acc.checked_add(reach))
                .ok_or(NpyError::Overflow)
        })?;
        let collapsed = collapse(&dims, byte_width);
        trace!("strided layout {:?} collapsed to {:?}", dims, collapsed);

        Ok(StridedLayout { dims: collapsed, width: byte_width, payload_len, span })
    }

    /// bytes emitted by `write_to`
    pub fn payload_len(&self) -> usize {
        self.payload_len
    }

    /// bytes from the first element to the end of the furthest one
    pub fn span(&self) -> usize {
        self.span
    }

    /// number of dimensions actually walked
    pub fn walk_rank(&self) -> usize {
        self.dims.len()
    }

    /// `data` must cover the whole span
    pub fn check(&self, data: &[u8]) -> Result<()> {
        if self.payload_len > 0 && data.is_empty() {
            return Err(NpyError::MissingData);
        }
        if data.len() < self.span {
            return Err(NpyError::OutOfBounds { needed: self.span, len: data.len() });
        }
        Ok(())
    }

    /// emits the view in row-major order
    pub fn write_to<W: Write + ?Sized>(&self, sink: &mut W, data: &[u8]) -> Result<()> {
        self.check(data)?;
        walk(sink, data, self.width, &self.dims, true)?;
        Ok(())
    }
}

/// Merges each dimension into its inner neighbour when stepping over the
/// whole inner dimension lands exactly on the next outer element, and drops
/// unit dimensions. Dims are outermost first.
fn collapse(dims: &[Dim], width: usize) -> Vec<Dim> {
    let mut out: Vec<Dim> = Vec::with_capacity(dims.len());
    for dim in dims.iter().rev() {
        if dim.extent == 1 {
            continue;
        }
        let merged = match out.last_mut() {
            Some(inner) if inner.stride.checked_mul(inner.extent) == Some(dim.stride) => {
                inner.extent *= dim.extent;
                true
            }
            _ => false,
        };
        if !merged {
            out.push(*dim);
        }
    }
    if out.is_empty() {
        out.push(Dim { extent: 1, stride: width });
    }
    out.reverse();
    out
}

/// recursive walk, outermost dimension first. `bulk` enables the single
/// write for an innermost dimension that is dense.
fn walk<W: Write + ?Sized>(
    sink: &mut W,
    data: &[u8],
    width: usize,
    dims: &[Dim],
    bulk: bool,
) -> io::Result<()> {
    match dims.split_first() {
        None => Ok(()),
        Some((dim, [])) => {
            if bulk && dim.stride == width {
                return sink.write_all(&data[..dim.extent * width]);
            }
            let mut offset = 0;
            for i in 0..dim.extent {
                if i > 0 {
                    offset += dim.stride;
                }
                sink.write_all(&data[offset..offset + width])?;
            }
            Ok(())
        }
        Some((dim, inner)) => {
            let mut offset = 0;
            for i in 0..dim.extent {
                if i > 0 {
                    offset += dim.stride;
                }
                walk(sink, &data[offset..], width, inner, bulk)?;
            }
            Ok(())
        }
    }
}
