//! strided_npy writes numeric tensors to `.npy` files, either from a
//! contiguous row-major buffer or straight from a strided view.
#![deny(missing_docs)]

extern crate byteorder;
extern crate libc;
#[macro_use]
extern crate log;
#[cfg(test)]
extern crate tempdir;

/// crate error type
pub mod error;
/// NPY header builder and payload writers
pub mod npy;
/// adapter for tensors owned by an external runtime
pub mod tensor;
/// C FFI functions
pub mod ffi;

pub use crate::error::{NpyError, Result};
pub use crate::npy::{
    build_header, create_npy, create_strided_npy, npy_len, write_npy, write_strided_npy,
    ElementDescriptor, HeaderBytes, Shape, TypeClass,
};
pub use crate::tensor::{save_npy, save_npy_create, ElementKind, HostTensor, Tensor};
