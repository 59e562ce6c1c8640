/// element type class and width
pub mod element;
/// validated array shape
pub mod shape;
/// header builder
pub mod header;
/// contiguous and strided payload writers
pub mod payload;
/// high level write functions
pub mod writer;

pub use self::element::{ElementDescriptor, TypeClass, MAX_ELEMENT_WIDTH};
pub use self::header::{build_header, HeaderBytes, ALIGNMENT};
pub use self::payload::{write_contiguous, write_strided, StridedLayout};
pub use self::shape::Shape;
pub use self::writer::{create_npy, create_strided_npy, npy_len, write_npy, write_strided_npy};
