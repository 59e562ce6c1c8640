use byteorder::{ByteOrder, LittleEndian};
use std::io::Write;
use std::path::Path;

use crate::error::{NpyError, Result};
use crate::npy::{create_npy, create_strided_npy, write_npy, write_strided, write_strided_npy};
use crate::npy::{ElementDescriptor, Shape, TypeClass};

/// Element kinds a tensor runtime may hold. Only the plain integer and
/// float kinds have an npy dtype.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    /// 64 bit float
    F64,
    /// 32 bit float
    F32,
    /// IEEE half
    F16,
    /// bfloat16, no numpy equivalent
    BF16,
    /// 64 bit signed
    I64,
    /// 32 bit signed
    I32,
    /// 16 bit signed
    I16,
    /// 8 bit signed
    I8,
    /// block quantized formats, e.g. "q4_0"
    Quantized(&'static str),
}

impl ElementKind {
    /// npy type class and width, or `UnsupportedKind`
    pub fn descriptor(self) -> Result<ElementDescriptor> {
        let (class, width) = match self {
            ElementKind::F64 => (TypeClass::Float, 8),
            ElementKind::F32 => (TypeClass::Float, 4),
            ElementKind::F16 => (TypeClass::Float, 2),
            ElementKind::I64 => (TypeClass::SignedInt, 8),
            ElementKind::I32 => (TypeClass::SignedInt, 4),
            ElementKind::I16 => (TypeClass::SignedInt, 2),
            ElementKind::I8 => (TypeClass::SignedInt, 1),
            ElementKind::BF16 => return Err(NpyError::UnsupportedKind("bf16".into())),
            ElementKind::Quantized(name) => return Err(NpyError::UnsupportedKind(name.into())),
        };
        ElementDescriptor::new(class, width)
    }
}

/// What the serializer needs from a tensor owned by some runtime.
///
/// `host_data` returns the bytes starting at the first element when the
/// memory is directly readable, `None` when it lives on a device. In that
/// case `copy_out` fills a dense row-major host buffer.
pub trait Tensor {
    /// element kind
    fn kind(&self) -> ElementKind;
    /// extents, outermost first
    fn shape(&self) -> &[u64];
    /// byte strides, parallel to `shape`
    fn strides(&self) -> &[usize];
    /// directly addressable bytes, if any
    fn host_data(&self) -> Option<&[u8]>;
    /// copies the tensor into `dest`, dense and row-major
    fn copy_out(&self, dest: &mut [u8]) -> Result<()>;

    /// whether `host_data` is available
    fn is_host_accessible(&self) -> bool {
        self.host_data().is_some()
    }
}

/// Writes `tensor` as `.npy`, strided straight from host memory when
/// possible, otherwise through a transient copy.
pub fn save_npy<W: Write, T: Tensor + ?Sized>(sink: W, tensor: &T) -> Result<()> {
    let descriptor = tensor.kind().descriptor()?;
    match tensor.host_data() {
        Some(data) => write_strided_npy(sink, tensor.shape(), tensor.strides(), data, descriptor),
        None => {
            let buf = copy_to_host(tensor, descriptor)?;
            write_npy(sink, tensor.shape(), &buf, descriptor)
        }
    }
}

/// `save_npy` into a newly created (or truncated) file
pub fn save_npy_create<P: AsRef<Path>, T: Tensor + ?Sized>(fname: P, tensor: &T) -> Result<()> {
    let descriptor = tensor.kind().descriptor()?;
    match tensor.host_data() {
        Some(data) => create_strided_npy(fname, tensor.shape(), tensor.strides(), data, descriptor),
        None => {
            let buf = copy_to_host(tensor, descriptor)?;
            create_npy(fname, tensor.shape(), &buf, descriptor)
        }
    }
}

fn copy_to_host<T: Tensor + ?Sized>(tensor: &T, descriptor: ElementDescriptor) -> Result<Vec<u8>> {
    let nbytes = Shape::new(tensor.shape())?.num_bytes(descriptor.width())?;
    trace!("tensor not host accessible, copying out {} bytes", nbytes);
    let mut buf = vec![0u8; nbytes];
    tensor.copy_out(&mut buf)?;
    Ok(buf)
}

/// A tensor held in host memory: owned bytes plus a strided layout over them
#[derive(Clone, Debug, PartialEq)]
pub struct HostTensor {
    kind: ElementKind,
    shape: Vec<u64>,
    strides: Vec<usize>,
    data: Vec<u8>,
}

impl HostTensor {
    /// dense row-major tensor over `data`
    pub fn from_bytes(kind: ElementKind, shape: &[u64], data: Vec<u8>) -> Result<HostTensor> {
        let descriptor = kind.descriptor()?;
        let dims = Shape::new(shape)?;
        let needed = dims.num_bytes(descriptor.width())?;
        if data.len() != needed {
            return Err(NpyError::OutOfBounds { needed, len: data.len() });
        }
        Ok(HostTensor {
            kind,
            shape: shape.to_vec(),
            strides: dims.row_major_strides(descriptor.width())?,
            data,
        })
    }

    /// dense row-major f32 tensor
    pub fn from_f32(shape: &[u64], values: &[f32]) -> Result<HostTensor> {
        let mut data = vec![0u8; values.len() * 4];
        LittleEndian::write_f32_into(values, &mut data);
        HostTensor::from_bytes(ElementKind::F32, shape, data)
    }

    /// dense row-major i32 tensor
    pub fn from_i32(shape: &[u64], values: &[i32]) -> Result<HostTensor> {
        let mut data = vec![0u8; values.len() * 4];
        LittleEndian::write_i32_into(values, &mut data);
        HostTensor::from_bytes(ElementKind::I32, shape, data)
    }

    /// reverses the axes; only the layout changes, the bytes stay put
    pub fn transposed(mut self) -> HostTensor {
        self.shape.reverse();
        self.strides.reverse();
        self
    }

    /// the backing bytes
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Tensor for HostTensor {
    fn kind(&self) -> ElementKind {
        self.kind
    }

    fn shape(&self) -> &[u64] {
        &self.shape
    }

    fn strides(&self) -> &[usize] {
        &self.strides
    }

    fn host_data(&self) -> Option<&[u8]> {
        Some(&self.data)
    }

    fn copy_out(&self, dest: &mut [u8]) -> Result<()> {
        let width = self.kind.descriptor()?.width();
        let mut cursor = &mut dest[..];
        write_strided(&mut cursor, &self.data, width, &self.shape, &self.strides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// tensor whose bytes can only be reached through `copy_out`
    struct DeviceTensor {
        inner: HostTensor,
        copies: Cell<usize>,
    }

    impl Tensor for DeviceTensor {
        fn kind(&self) -> ElementKind {
            self.inner.kind()
        }
        fn shape(&self) -> &[u64] {
            self.inner.shape()
        }
        fn strides(&self) -> &[usize] {
            self.inner.strides()
        }
        fn host_data(&self) -> Option<&[u8]> {
            None
        }
        fn copy_out(&self, dest: &mut [u8]) -> Result<()> {
            self.copies.set(self.copies.get() + 1);
            self.inner.copy_out(dest)
        }
    }

    fn sample() -> HostTensor {
        let values: Vec<f32> = (0..12).map(|v| 100. + v as f32).collect();
        HostTensor::from_f32(&[3, 4], &values).unwrap()
    }

    #[test]
    fn should_map_numeric_kinds() {
        assert_eq!(ElementKind::F64.descriptor().unwrap().to_string(), "<f8");
        assert_eq!(ElementKind::F32.descriptor().unwrap().to_string(), "<f4");
        assert_eq!(ElementKind::F16.descriptor().unwrap().to_string(), "<f2");
        assert_eq!(ElementKind::I64.descriptor().unwrap().to_string(), "<i8");
        assert_eq!(ElementKind::I32.descriptor().unwrap().to_string(), "<i4");
        assert_eq!(ElementKind::I16.descriptor().unwrap().to_string(), "<i2");
        assert_eq!(ElementKind::I8.descriptor().unwrap().to_string(), "<i1");
    }

    #[test]
    fn should_reject_packed_kinds_before_writing() {
        let mut tensor = sample();
        tensor.kind = ElementKind::Quantized("q4_0");
        let mut out = Vec::new();
        match save_npy(&mut out, &tensor) {
            Err(NpyError::UnsupportedKind(ref name)) => assert_eq!(name, "q4_0"),
            other => panic!("expected UnsupportedKind, got {:?}", other),
        }
        tensor.kind = ElementKind::BF16;
        assert!(save_npy(&mut out, &tensor).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn should_copy_out_device_tensors() {
        let host = sample();
        let device = DeviceTensor { inner: host.clone(), copies: Cell::new(0) };
        assert!(host.is_host_accessible());
        assert!(!device.is_host_accessible());

        let mut from_host = Vec::new();
        save_npy(&mut from_host, &host).unwrap();
        let mut from_device = Vec::new();
        save_npy(&mut from_device, &device).unwrap();

        assert_eq!(device.copies.get(), 1);
        assert_eq!(from_host, from_device);
        assert_eq!(&from_host[64..], host.bytes());
    }

    #[test]
    fn should_copy_out_transposed_layout_row_major() {
        let device = DeviceTensor { inner: sample().transposed(), copies: Cell::new(0) };
        let mut out = Vec::new();
        save_npy(&mut out, &device).unwrap();

        let mut values = vec![0f32; 12];
        LittleEndian::read_f32_into(&out[64..], &mut values);
        assert_eq!(&values[..4], &[100., 104., 108., 101.]);
    }

    #[test]
    fn should_write_transposed_view_without_copy() {
        let tensor = sample().transposed();
        assert_eq!(tensor.shape(), &[4, 3]);
        assert_eq!(tensor.strides(), &[4, 16]);

        let mut out = Vec::new();
        save_npy(&mut out, &tensor).unwrap();
        assert!(String::from_utf8_lossy(&out[10..64]).contains("'shape':(4,3)"));

        let mut values = vec![0f32; 12];
        LittleEndian::read_f32_into(&out[64..], &mut values);
        let expected: Vec<f32> = (0..4)
            .flat_map(|c| (0..3).map(move |r| 100. + (r * 4 + c) as f32))
            .collect();
        assert_eq!(values, expected);
    }

    #[test]
    fn should_check_byte_count() {
        match HostTensor::from_f32(&[2, 2], &[1., 2., 3.]) {
            Err(NpyError::OutOfBounds { needed: 16, len: 12 }) => (),
            other => panic!("expected OutOfBounds, got {:?}", other),
        }
    }
}
