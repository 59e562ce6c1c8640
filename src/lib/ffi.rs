use std::ffi::CStr;
use std::slice;

use libc::{c_char, c_uint, c_void, size_t};

use crate::error::{NpyError, Result};
use crate::npy::{create_npy, create_strided_npy, ElementDescriptor, Shape, StridedLayout, TypeClass};

/// Takes a pointer to a string from C and borrows it as `&str`.
unsafe fn ptr_to_str<'a>(ptr: *const c_char) -> Result<&'a str> {
    if ptr.is_null() {
        return Err(NpyError::MissingData);
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| NpyError::InvalidArgument("non utf-8 filename".into()))
}

unsafe fn shape_from_raw(shape: *const i64, ndims: c_uint) -> Result<Vec<u64>> {
    if ndims == 0 {
        return Err(NpyError::EmptyShape);
    }
    if shape.is_null() {
        return Err(NpyError::MissingData);
    }
    slice::from_raw_parts(shape, ndims as usize)
        .iter()
        .map(|&d| {
            if d < 0 {
                Err(NpyError::InvalidArgument(format!("negative extent {}", d)))
            } else {
                Ok(d as u64)
            }
        })
        .collect()
}

fn descriptor_from_raw(dtype: c_char, dtype_bytes: c_uint) -> Result<ElementDescriptor> {
    let tag = dtype as u8 as char;
    let class = TypeClass::from_char(tag).ok_or_else(|| NpyError::UnsupportedKind(tag.to_string()))?;
    ElementDescriptor::new(class, dtype_bytes as usize)
}

/// a null pointer is only acceptable when no byte is read
unsafe fn bytes_from_raw<'a>(data: *const c_void, len: usize) -> Result<&'a [u8]> {
    if len == 0 {
        return Ok(&[]);
    }
    if data.is_null() {
        return Err(NpyError::MissingData);
    }
    Ok(slice::from_raw_parts(data as *const u8, len))
}

fn report(fname: &str, ret: Result<()>) -> bool {
    match ret {
        Ok(()) => true,
        Err(err) => {
            warn!("npy write to {} failed: {}", fname, err);
            false
        }
    }
}

/// Writes a dense row-major array to a new file `filename`.
/// `dtype` is 'f' or 'i', `dtype_bytes` at most 8. Returns true on success.
///
/// # Safety
/// `filename` must be null or a nul terminated string, `shape` must point to
/// `ndims` extents and `data` to the whole row-major payload.
#[no_mangle]
pub unsafe extern "C" fn npy_write_create(
    filename: *const c_char,
    shape: *const i64,
    ndims: c_uint,
    data: *const c_void,
    dtype_bytes: c_uint,
    dtype: c_char,
) -> bool {
    let fname = match ptr_to_str(filename) {
        Ok(fname) => fname,
        Err(_) => return false,
    };
    let ret = (|| {
        let dims = shape_from_raw(shape, ndims)?;
        let descriptor = descriptor_from_raw(dtype, dtype_bytes)?;
        let nbytes = Shape::new(&dims)?.num_bytes(descriptor.width())?;
        let bytes = bytes_from_raw(data, nbytes)?;
        create_npy(fname, &dims, bytes, descriptor)
    })();
    report(fname, ret)
}

/// Writes the strided view at `data` to a new file `filename`, row-major.
/// `strides` holds one byte stride per dimension. Returns true on success.
///
/// # Safety
/// As `npy_write_create`, plus `strides` must point to `ndims` values and
/// every element reachable through them must be readable.
#[no_mangle]
pub unsafe extern "C" fn npy_write_strided_create(
    filename: *const c_char,
    shape: *const i64,
    ndims: c_uint,
    strides: *const size_t,
    data: *const c_void,
    dtype_bytes: c_uint,
    dtype: c_char,
) -> bool {
    let fname = match ptr_to_str(filename) {
        Ok(fname) => fname,
        Err(_) => return false,
    };
    let ret = (|| {
        let dims = shape_from_raw(shape, ndims)?;
        if strides.is_null() {
            return Err(NpyError::MissingData);
        }
        let strides = slice::from_raw_parts(strides, ndims as usize);
        let descriptor = descriptor_from_raw(dtype, dtype_bytes)?;
        let layout = StridedLayout::new(Shape::new(&dims)?, strides, descriptor.width())?;
        let bytes = bytes_from_raw(data, layout.span())?;
        create_strided_npy(fname, &dims, strides, bytes, descriptor)
    })();
    report(fname, ret)
}
