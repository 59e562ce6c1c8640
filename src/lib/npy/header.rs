//!
//! NPY version 1.0 header
//!
//! Offset 00: ([u8; 6]) magic value \x93NUMPY
//! Offset 06: (u8) major version, 1
//! Offset 07: (u8) minor version, 0
//! Offset 08: (u16 LE) length H of the dictionary that follows
//! Offset 10: ([u8; H]) python dict literal, space padded, '\n' terminated
//!
//! 10 + H is always a multiple of `ALIGNMENT` so the payload starts aligned.

use byteorder::{ByteOrder, LittleEndian};
use std::io::Write;
use std::str;

use crate::error::{NpyError, Result};
use crate::npy::shape::Shape;

static MAGIC_VALUE: &[u8] = &[0x93, 0x4E, 0x55, 0x4D, 0x50, 0x59]; // \x93NUMPY
const MAJOR_VERSION: u8 = 0x01;
const MINOR_VERSION: u8 = 0x00;
const LEN_OFFSET: usize = 8;
/// bytes before the dictionary: magic, version and the length field
pub const PREFIX_LEN: usize = 10;
/// the whole header is padded to a multiple of this
pub const ALIGNMENT: usize = 64;
/// the width is written as at most two decimal digits
const MAX_HEADER_WIDTH: usize = 99;

/// Finished header, ready to be written in front of the payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderBytes(Vec<u8>);

impl HeaderBytes {
    /// the raw header
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// total header length, magic included
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// never true for a built header
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// value stored in the length field
    pub fn dict_len(&self) -> usize {
        self.0.len() - PREFIX_LEN
    }

    /// the dictionary text including padding and the trailing newline
    pub fn dict(&self) -> &str {
        // only ascii is ever pushed past the prefix
        str::from_utf8(&self.0[PREFIX_LEN..]).unwrap_or("")
    }
}

impl AsRef<[u8]> for HeaderBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Builds the header for an array of `shape` whose elements are `type_tag`
/// (e.g. 'f', 'i') and `byte_width` bytes wide. Always little endian,
/// always C order.
pub fn build_header(type_tag: char, byte_width: usize, shape: &[u64]) -> Result<HeaderBytes> {
    if byte_width == 0 || byte_width > MAX_HEADER_WIDTH {
        return Err(NpyError::UnsupportedWidth(byte_width));
    }
    if !type_tag.is_ascii_alphabetic() {
        return Err(NpyError::UnsupportedKind(type_tag.to_string()));
    }
    let shape = Shape::new(shape)?;

    let mut buf = Vec::with_capacity(ALIGNMENT);
    buf.extend_from_slice(MAGIC_VALUE);
    buf.push(MAJOR_VERSION);
    buf.push(MINOR_VERSION);
    buf.extend_from_slice(&[0, 0]); // patched below
    write!(buf, "{{'descr':'<{}{}','fortran_order':False,'shape':(", type_tag, byte_width)?;
    write_extents(&mut buf, shape.dims())?;
    buf.extend_from_slice(b")}");

    let npad = padding(buf.len() + 1);
    buf.resize(buf.len() + npad, b' ');
    buf.push(b'\n');

    let dict_len = buf.len() - PREFIX_LEN;
    if dict_len > u16::max_value() as usize {
        return Err(NpyError::HeaderTooLong(dict_len));
    }
    LittleEndian::write_u16(&mut buf[LEN_OFFSET..PREFIX_LEN], dict_len as u16);

    debug!("built npy header <{}{} {:?}: {} bytes", type_tag, byte_width, shape.dims(), buf.len());
    Ok(HeaderBytes(buf))
}

/// a 1-tuple keeps its trailing comma
fn write_extents(buf: &mut Vec<u8>, dims: &[u64]) -> Result<()> {
    if let [d] = dims {
        write!(buf, "{},", d)?;
        return Ok(());
    }
    for (i, d) in dims.iter().enumerate() {
        if i > 0 {
            buf.push(b',');
        }
        write!(buf, "{}", d)?;
    }
    Ok(())
}

fn padding(len: usize) -> usize {
    let npad = ALIGNMENT - len % ALIGNMENT;
    if npad == ALIGNMENT {
        0
    } else {
        npad
    }
}
