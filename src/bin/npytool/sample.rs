use std::error::Error;
use std::fs;
use std::path::Path;

use strided_npy::{build_header, npy_len, save_npy_create, HostTensor, Tensor};

/// One line of the manifest printed after `sample`
#[derive(Serialize, Debug)]
pub struct ManifestEntry {
    pub name: String,
    pub path: String,
    pub shape: Vec<u64>,
    pub transposed: bool,
    pub header_len: usize,
    pub bytes: usize,
}

/// Sample tensor `i`: rank 1..=4, extents 1..=10, element j = 100 + i + j
pub fn sample_tensor(i: usize) -> Result<HostTensor, Box<dyn Error>> {
    let rank = i % 4 + 1;
    let shape: Vec<u64> = (0..rank).map(|j| ((i * 7 + j * 3) % 10 + 1) as u64).collect();
    let n: u64 = shape.iter().product();
    let values: Vec<f32> = (0..n).map(|j| 100. + i as f32 + j as f32).collect();
    Ok(HostTensor::from_f32(&shape, &values)?)
}

pub fn run(folder: &str, count: usize, transposed: bool) -> Result<Vec<ManifestEntry>, Box<dyn Error>> {
    if !Path::new(folder).exists() {
        fs::create_dir_all(folder)?;
    }

    let mut entries = Vec::with_capacity(count);
    for i in 0..count {
        let name = format!("tensor_{}", i);
        let mut tensor = sample_tensor(i)?;
        if transposed {
            tensor = tensor.transposed();
        }
        let path = format!("{}/{}.npy", folder, name);
        save_npy_create(&path, &tensor)?;

        let descriptor = tensor.kind().descriptor()?;
        let header = build_header(descriptor.class().as_char(), descriptor.width(), tensor.shape())?;
        let bytes = npy_len(descriptor, tensor.shape())?;
        info!("wrote {} {:?} to {} ({} bytes)", name, tensor.shape(), path, bytes);

        entries.push(ManifestEntry {
            name,
            path,
            shape: tensor.shape().to_vec(),
            transposed,
            header_len: header.len(),
            bytes,
        });
    }
    Ok(entries)
}
