use std::fmt;

use crate::error::{NpyError, Result};

/// Largest element the writers accept, in bytes
pub const MAX_ELEMENT_WIDTH: usize = 8;

/// numpy type class, the letter following the byte order mark in `descr`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeClass {
    /// 'f'
    Float,
    /// 'i'
    SignedInt,
}

impl TypeClass {
    /// the single character written into the header
    pub fn as_char(self) -> char {
        match self {
            TypeClass::Float => 'f',
            TypeClass::SignedInt => 'i',
        }
    }

    /// inverse of `as_char`
    pub fn from_char(c: char) -> Option<TypeClass> {
        match c {
            'f' => Some(TypeClass::Float),
            'i' => Some(TypeClass::SignedInt),
            _ => None,
        }
    }
}

/// Type class plus byte width of a single array element
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ElementDescriptor {
    class: TypeClass,
    width: usize,
}

impl ElementDescriptor {
    /// rejects widths outside `1..=MAX_ELEMENT_WIDTH`
    pub fn new(class: TypeClass, width: usize) -> Result<ElementDescriptor> {
        if width == 0 || width > MAX_ELEMENT_WIDTH {
            return Err(NpyError::UnsupportedWidth(width));
        }
        Ok(ElementDescriptor { class, width })
    }

    /// little endian f32
    pub fn f32() -> ElementDescriptor {
        ElementDescriptor { class: TypeClass::Float, width: 4 }
    }

    /// little endian f64
    pub fn f64() -> ElementDescriptor {
        ElementDescriptor { class: TypeClass::Float, width: 8 }
    }

    /// little endian i32
    pub fn i32() -> ElementDescriptor {
        ElementDescriptor { class: TypeClass::SignedInt, width: 4 }
    }

    /// type class
    pub fn class(&self) -> TypeClass {
        self.class
    }

    /// bytes per element
    pub fn width(&self) -> usize {
        self.width
    }
}

/// formats as the npy `descr` value, e.g. `<f4`
impl fmt::Display for ElementDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<{}{}", self.class.as_char(), self.width)
    }
}
