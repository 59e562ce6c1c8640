use std::error;
use std::fmt;
use std::io;

/// Everything that can go wrong while writing an `.npy` file
#[derive(Debug)]
pub enum NpyError {
    /// rank 0 shape
    EmptyShape,
    /// element byte width outside the accepted range
    UnsupportedWidth(usize),
    /// element kind with no npy dtype (bf16, quantized blocks, ...)
    UnsupportedKind(String),
    /// strides vector length differs from the rank
    StrideRankMismatch {
        /// rank of the shape
        rank: usize,
        /// number of strides supplied
        strides: usize,
    },
    /// no data supplied for a non-empty array
    MissingData,
    /// the view reaches past the end of the borrowed bytes
    OutOfBounds {
        /// bytes the view needs
        needed: usize,
        /// bytes available
        len: usize,
    },
    /// element or byte count does not fit in usize
    Overflow,
    /// header dictionary does not fit the u16 length field
    HeaderTooLong(usize),
    /// malformed argument from a foreign caller
    InvalidArgument(String),
    /// sink or file failure
    Io(io::Error),
}
use self::NpyError::*;

impl error::Error for NpyError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for NpyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            EmptyShape => write!(f, "EmptyShape: npy arrays need rank >= 1"),
            UnsupportedWidth(w) => write!(f, "UnsupportedWidth: {} bytes", w),
            UnsupportedKind(ref kind) => write!(f, "UnsupportedKind: {}", kind),
            StrideRankMismatch { rank, strides } => {
                write!(f, "StrideRankMismatch: rank {} but {} strides", rank, strides)
            }
            MissingData => write!(f, "MissingData"),
            OutOfBounds { needed, len } => {
                write!(f, "OutOfBounds: view needs {} bytes, buffer has {}", needed, len)
            }
            Overflow => write!(f, "Overflow"),
            HeaderTooLong(len) => write!(f, "HeaderTooLong: {} bytes", len),
            InvalidArgument(ref msg) => write!(f, "InvalidArgument: {}", msg),
            Io(ref err) => write!(f, "Io: {}", err),
        }
    }
}

impl From<io::Error> for NpyError {
    fn from(err: io::Error) -> Self {
        NpyError::Io(err)
    }
}

/// crate result alias
pub type Result<T> = std::result::Result<T, NpyError>;
