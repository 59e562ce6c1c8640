use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{NpyError, Result};
use crate::npy::element::ElementDescriptor;
use crate::npy::header::{build_header, HeaderBytes};
use crate::npy::payload::{contiguous_len, write_contiguous, StridedLayout};
use crate::npy::shape::Shape;

/// a write that passed validation and only has I/O left to do
struct Prepared<'a> {
    header: HeaderBytes,
    payload: Payload<'a>,
}

enum Payload<'a> {
    Contiguous { data: &'a [u8], width: usize, count: usize },
    Strided { data: &'a [u8], layout: StridedLayout },
}

impl<'a> Prepared<'a> {
    fn contiguous(shape: &[u64], data: &'a [u8], descriptor: ElementDescriptor) -> Result<Prepared<'a>> {
        let count = Shape::new(shape)?.num_elements()?;
        contiguous_len(data, descriptor.width(), count)?;
        let header = build_header(descriptor.class().as_char(), descriptor.width(), shape)?;
        Ok(Prepared {
            header,
            payload: Payload::Contiguous { data, width: descriptor.width(), count },
        })
    }

    fn strided(
        shape: &[u64],
        strides: &[usize],
        data: &'a [u8],
        descriptor: ElementDescriptor,
    ) -> Result<Prepared<'a>> {
        let layout = StridedLayout::new(Shape::new(shape)?, strides, descriptor.width())?;
        layout.check(data)?;
        let header = build_header(descriptor.class().as_char(), descriptor.width(), shape)?;
        Ok(Prepared { header, payload: Payload::Strided { data, layout } })
    }

    fn len(&self) -> usize {
        let payload = match self.payload {
            Payload::Contiguous { width, count, .. } => width * count,
            Payload::Strided { ref layout, .. } => layout.payload_len(),
        };
        self.header.len() + payload
    }

    fn write_to<W: Write + ?Sized>(&self, wtr: &mut W) -> Result<()> {
        wtr.write_all(self.header.as_bytes())?;
        match self.payload {
            Payload::Contiguous { data, width, count } => write_contiguous(wtr, data, width, count)?,
            Payload::Strided { data, ref layout } => layout.write_to(wtr, data)?,
        }
        wtr.flush()?;
        debug!("wrote {} npy bytes ({} header)", self.len(), self.header.len());
        Ok(())
    }
}

/// Exact number of bytes `write_npy` or `write_strided_npy` produce for an
/// array of `shape`. Lets a container lay out its tensor directory first.
pub fn npy_len(descriptor: ElementDescriptor, shape: &[u64]) -> Result<usize> {
    let payload = Shape::new(shape)?.num_bytes(descriptor.width())?;
    let header = build_header(descriptor.class().as_char(), descriptor.width(), shape)?;
    header.len().checked_add(payload).ok_or(NpyError::Overflow)
}

/// Writes a dense row-major array as `.npy`.
///
/// Pass `&mut sink` to keep the sink, or the sink itself to have it dropped
/// (closed) once the call returns, whatever the outcome. Input is fully
/// validated before the first byte is written.
pub fn write_npy<W: Write>(
    mut sink: W,
    shape: &[u64],
    data: &[u8],
    descriptor: ElementDescriptor,
) -> Result<()> {
    Prepared::contiguous(shape, data, descriptor)?.write_to(&mut sink)
}

/// Writes the view described by `shape` and byte `strides` as `.npy`, in
/// row-major order, straight from `data`. Sink ownership as in `write_npy`.
pub fn write_strided_npy<W: Write>(
    mut sink: W,
    shape: &[u64],
    strides: &[usize],
    data: &[u8],
    descriptor: ElementDescriptor,
) -> Result<()> {
    Prepared::strided(shape, strides, data, descriptor)?.write_to(&mut sink)
}

/// `write_npy` into a newly created (or truncated) file
pub fn create_npy<P: AsRef<Path>>(
    fname: P,
    shape: &[u64],
    data: &[u8],
    descriptor: ElementDescriptor,
) -> Result<()> {
    let prepared = Prepared::contiguous(shape, data, descriptor)?;
    create_with(fname.as_ref(), &prepared)
}

/// `write_strided_npy` into a newly created (or truncated) file
pub fn create_strided_npy<P: AsRef<Path>>(
    fname: P,
    shape: &[u64],
    strides: &[usize],
    data: &[u8],
    descriptor: ElementDescriptor,
) -> Result<()> {
    let prepared = Prepared::strided(shape, strides, data, descriptor)?;
    create_with(fname.as_ref(), &prepared)
}

fn file_writer(fname: &Path) -> Result<BufWriter<File>> {
    let new_file = File::create(fname)?;
    Ok(BufWriter::new(new_file))
}

fn create_with(fname: &Path, prepared: &Prepared) -> Result<()> {
    let wtr = file_writer(fname)?;
    finish_file(fname, wtr, prepared)
}

/// the writer is closed on every path; a half written regular file is removed
fn finish_file<W: Write>(fname: &Path, mut wtr: W, prepared: &Prepared) -> Result<()> {
    let ret = prepared.write_to(&mut wtr);
    drop(wtr);
    if let Err(ref err) = ret {
        match fs::metadata(fname) {
            Ok(ref meta) if meta.is_file() => {
                warn!("writing {} failed: {}, removing partial file", fname.display(), err);
                if let Err(rm_err) = fs::remove_file(fname) {
                    warn!("could not remove {}: {}", fname.display(), rm_err);
                }
            }
            _ => warn!("writing {} failed: {}, not a regular file, left in place", fname.display(), err),
        }
    }
    ret
}
