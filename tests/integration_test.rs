extern crate byteorder;
extern crate strided_npy;
extern crate tempdir;

use byteorder::{LittleEndian, ReadBytesExt};
use std::ffi::CString;
use std::fs::{self, File};
use std::io::{Cursor, Read};
use std::path::Path;

use strided_npy::ffi::{npy_write_create, npy_write_strided_create};
use strided_npy::{
    create_npy, create_strided_npy, npy_len, save_npy_create, ElementDescriptor, ElementKind,
    HostTensor, NpyError, Result, Tensor,
};
use tempdir::TempDir;

/// bare bones reader: returns the dictionary text and the payload
fn read_npy(fname: &Path) -> (String, Vec<u8>) {
    let mut bytes = Vec::new();
    File::open(fname).unwrap().read_to_end(&mut bytes).unwrap();

    let mut rdr = Cursor::new(&bytes);
    let mut magic = [0u8; 8];
    rdr.read_exact(&mut magic).unwrap();
    assert_eq!(&magic, b"\x93NUMPY\x01\x00");
    let dict_len = rdr.read_u16::<LittleEndian>().unwrap() as usize;
    assert_eq!((10 + dict_len) % 64, 0);

    let dict = String::from_utf8(bytes[10..10 + dict_len].to_vec()).unwrap();
    (dict, bytes[10 + dict_len..].to_vec())
}

fn read_f32s(payload: &[u8]) -> Vec<f32> {
    let mut rdr = Cursor::new(payload);
    (0..payload.len() / 4).map(|_| rdr.read_f32::<LittleEndian>().unwrap()).collect()
}

#[test]
fn it_writes_a_readable_file() {
    let dir = TempDir::new("npy").unwrap();
    let fname = dir.path().join("example.npy");
    let tensor = HostTensor::from_f32(&[2, 3], &[1., 2., 3., 4., 5., 6.]).unwrap();

    create_npy(&fname, &[2, 3], tensor.bytes(), ElementDescriptor::f32()).unwrap();

    let (dict, payload) = read_npy(&fname);
    assert_eq!(dict, "{'descr':'<f4','fortran_order':False,'shape':(2,3)}  \n");
    assert_eq!(read_f32s(&payload), vec![1., 2., 3., 4., 5., 6.]);
    assert_eq!(
        fs::metadata(&fname).unwrap().len() as usize,
        npy_len(ElementDescriptor::f32(), &[2, 3]).unwrap()
    );
}

#[test]
fn it_truncates_an_existing_file() {
    let dir = TempDir::new("npy").unwrap();
    let fname = dir.path().join("old.npy");
    fs::write(&fname, vec![0xffu8; 4096]).unwrap();

    let data = 7i32.to_le_bytes();
    create_npy(&fname, &[1], &data, ElementDescriptor::i32()).unwrap();

    let (dict, payload) = read_npy(&fname);
    assert!(dict.contains("'shape':(1,)"));
    assert_eq!(payload, data.to_vec());
}

#[test]
fn it_writes_a_transposed_view_like_a_materialized_one() {
    let dir = TempDir::new("npy").unwrap();
    let values: Vec<f32> = (0..60).map(|v| v as f32).collect();
    let tensor = HostTensor::from_f32(&[3, 4, 5], &values).unwrap();

    let mut transposed = Vec::with_capacity(60);
    for k in 0..5 {
        for j in 0..4 {
            for i in 0..3 {
                transposed.push(values[i * 20 + j * 5 + k]);
            }
        }
    }
    let materialized = HostTensor::from_f32(&[5, 4, 3], &transposed).unwrap();

    let strided = dir.path().join("strided.npy");
    let dense = dir.path().join("dense.npy");
    create_strided_npy(&strided, &[5, 4, 3], &[4, 20, 80], tensor.bytes(), ElementDescriptor::f32()).unwrap();
    create_npy(&dense, &[5, 4, 3], materialized.bytes(), ElementDescriptor::f32()).unwrap();

    assert_eq!(fs::read(&strided).unwrap(), fs::read(&dense).unwrap());
    let (_, payload) = read_npy(&strided);
    assert_eq!(read_f32s(&payload), transposed);
}

/// only reachable through copy_out, like device memory
struct OffHost(HostTensor);

impl Tensor for OffHost {
    fn kind(&self) -> ElementKind {
        self.0.kind()
    }
    fn shape(&self) -> &[u64] {
        self.0.shape()
    }
    fn strides(&self) -> &[usize] {
        self.0.strides()
    }
    fn host_data(&self) -> Option<&[u8]> {
        None
    }
    fn copy_out(&self, dest: &mut [u8]) -> Result<()> {
        self.0.copy_out(dest)
    }
}

#[test]
fn it_saves_host_and_device_tensors_identically() {
    let dir = TempDir::new("npy").unwrap();
    let values: Vec<i32> = (-6..6).collect();
    let tensor = HostTensor::from_i32(&[2, 2, 3], &values).unwrap().transposed();

    let host = dir.path().join("host.npy");
    let device = dir.path().join("device.npy");
    save_npy_create(&host, &tensor).unwrap();
    save_npy_create(&device, &OffHost(tensor.clone())).unwrap();

    assert_eq!(fs::read(&host).unwrap(), fs::read(&device).unwrap());
    let (dict, payload) = read_npy(&host);
    assert!(dict.starts_with("{'descr':'<i4','fortran_order':False,'shape':(3,2,2)}"));
    assert_eq!(payload.len(), 12 * 4);
}

/// 32 elements packed in q8_0 blocks
struct Packed;

impl Tensor for Packed {
    fn kind(&self) -> ElementKind {
        ElementKind::Quantized("q8_0")
    }
    fn shape(&self) -> &[u64] {
        &[32]
    }
    fn strides(&self) -> &[usize] {
        &[1]
    }
    fn host_data(&self) -> Option<&[u8]> {
        Some(&[0u8; 34])
    }
    fn copy_out(&self, _dest: &mut [u8]) -> Result<()> {
        Ok(())
    }
}

#[test]
fn it_creates_no_file_for_invalid_input() {
    let dir = TempDir::new("npy").unwrap();
    let fname = dir.path().join("invalid.npy");

    match create_npy(&fname, &[], &[], ElementDescriptor::f32()) {
        Err(NpyError::EmptyShape) => (),
        other => panic!("expected EmptyShape, got {:?}", other),
    }
    match create_npy(&fname, &[4], &[0u8; 8], ElementDescriptor::f32()) {
        Err(NpyError::OutOfBounds { .. }) => (),
        other => panic!("expected OutOfBounds, got {:?}", other),
    }
    match save_npy_create(&fname, &Packed) {
        Err(NpyError::UnsupportedKind(ref name)) => assert_eq!(name, "q8_0"),
        other => panic!("expected UnsupportedKind, got {:?}", other),
    }
    assert!(HostTensor::from_bytes(ElementKind::Quantized("q8_0"), &[2], vec![1, 2]).is_err());
    assert!(!fname.exists());
}

#[test]
fn it_reports_open_failures() {
    let dir = TempDir::new("npy").unwrap();
    let fname = dir.path().join("missing").join("x.npy");
    match create_npy(&fname, &[1], &[0u8; 4], ElementDescriptor::f32()) {
        Err(NpyError::Io(_)) => (),
        other => panic!("expected Io, got {:?}", other),
    }
}

#[test]
fn it_writes_through_the_c_interface() {
    let dir = TempDir::new("npy").unwrap();
    let dense = dir.path().join("c_dense.npy");
    let strided = dir.path().join("c_strided.npy");
    let c_dense = CString::new(dense.to_str().unwrap()).unwrap();
    let c_strided = CString::new(strided.to_str().unwrap()).unwrap();

    let values: Vec<f32> = (0..6).map(|v| v as f32).collect();
    let shape = [2i64, 3];
    let strides = [12usize, 4];
    unsafe {
        assert!(npy_write_create(
            c_dense.as_ptr(),
            shape.as_ptr(),
            2,
            values.as_ptr() as *const _,
            4,
            b'f' as _
        ));
        assert!(npy_write_strided_create(
            c_strided.as_ptr(),
            shape.as_ptr(),
            2,
            strides.as_ptr(),
            values.as_ptr() as *const _,
            4,
            b'f' as _
        ));
        assert!(!npy_write_create(
            c_dense.as_ptr(),
            shape.as_ptr(),
            2,
            values.as_ptr() as *const _,
            16,
            b'f' as _
        ));
    }

    let (_, payload) = read_npy(&strided);
    assert_eq!(read_f32s(&payload), values);
    // the rejected call above left the earlier file alone
    assert_eq!(fs::read(&dense).unwrap(), fs::read(&strided).unwrap());
}
