//! Element types for parameter data
//!
//! This module defines the closed set of primitive element types a parameter
//! can carry, together with the two typed containers built on top of it:
//! - `ElementType`: the type tag (8/16/32/64-bit signed/unsigned integers,
//!   32/64-bit floats, character)
//! - `Elements<'a>`: a typed, borrowed slice of elements
//! - `ElementBuf`: a typed, owned buffer of elements
//!
//! All three are generated from one table so a new type cannot be added to one
//! without the others.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! element_types {
    ($($variant:ident($ty:ty) = $id:literal, numeric: $numeric:literal;)*) => {
        /// Primitive element type of a parameter
        ///
        /// The set is closed: every value a source produces either maps onto one
        /// of these tags or is left with an unresolved type.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum ElementType {
            $(
                #[allow(missing_docs)]
                $variant,
            )*
        }

        impl ElementType {
            /// All element types (for iteration)
            pub const ALL: [ElementType; 11] = [$(ElementType::$variant,)*];

            /// Short identifier used in configuration and diagnostics
            pub const fn id(&self) -> &'static str {
                match self {
                    $(ElementType::$variant => $id,)*
                }
            }

            /// Size of one element in bytes
            pub const fn size_of(&self) -> usize {
                match self {
                    $(ElementType::$variant => std::mem::size_of::<$ty>(),)*
                }
            }

            /// Whether the array marshaller can reorient this type
            pub const fn is_numeric(&self) -> bool {
                match self {
                    $(ElementType::$variant => $numeric,)*
                }
            }

            /// Parse from short identifier
            pub fn from_id(id: &str) -> Option<Self> {
                match id {
                    $($id => Some(ElementType::$variant),)*
                    _ => None,
                }
            }
        }

        /// Borrowed, typed slice of elements
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub enum Elements<'a> {
            $(
                #[allow(missing_docs)]
                $variant(&'a [$ty]),
            )*
        }

        impl<'a> Elements<'a> {
            /// Element type tag of this slice
            pub fn element_type(&self) -> ElementType {
                match self {
                    $(Elements::$variant(_) => ElementType::$variant,)*
                }
            }

            /// Number of elements
            pub fn len(&self) -> usize {
                match self {
                    $(Elements::$variant(s) => s.len(),)*
                }
            }

            /// Check if the slice holds no elements
            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            /// Copy the elements into an owned buffer
            pub fn to_buf(&self) -> ElementBuf {
                match self {
                    $(Elements::$variant(s) => ElementBuf::$variant(s.to_vec()),)*
                }
            }

            /// Native-endian byte image of the elements
            pub fn to_ne_bytes(&self) -> Vec<u8> {
                match self {
                    $(Elements::$variant(s) => s.iter().flat_map(|v| v.to_ne_bytes()).collect(),)*
                }
            }
        }

        /// Owned, typed buffer of elements
        #[derive(Debug, Clone, PartialEq)]
        pub enum ElementBuf {
            $(
                #[allow(missing_docs)]
                $variant(Vec<$ty>),
            )*
        }

        impl ElementBuf {
            /// Buffer of `len` zero-valued elements
            pub fn zeroed(element_type: ElementType, len: usize) -> Self {
                match element_type {
                    $(ElementType::$variant => ElementBuf::$variant(vec![<$ty>::default(); len]),)*
                }
            }

            /// Empty buffer with room for `capacity` elements
            pub fn with_capacity(element_type: ElementType, capacity: usize) -> Self {
                match element_type {
                    $(ElementType::$variant => ElementBuf::$variant(Vec::with_capacity(capacity)),)*
                }
            }

            /// Element type tag of this buffer
            pub fn element_type(&self) -> ElementType {
                match self {
                    $(ElementBuf::$variant(_) => ElementType::$variant,)*
                }
            }

            /// Number of elements
            pub fn len(&self) -> usize {
                match self {
                    $(ElementBuf::$variant(v) => v.len(),)*
                }
            }

            /// Check if the buffer holds no elements
            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            /// Borrow the buffer as a typed slice
            pub fn as_elements(&self) -> Elements<'_> {
                match self {
                    $(ElementBuf::$variant(v) => Elements::$variant(v),)*
                }
            }

            /// Truncate or zero-extend to exactly `len` elements
            pub fn resize(&mut self, len: usize) {
                match self {
                    $(ElementBuf::$variant(v) => v.resize(len, <$ty>::default()),)*
                }
            }

            /// Append `other` if it has the same element type
            ///
            /// Returns false (and leaves the buffer untouched) on a type mismatch.
            pub fn extend_from(&mut self, other: Elements<'_>) -> bool {
                match (self, other) {
                    $((ElementBuf::$variant(dst), Elements::$variant(src)) => {
                        dst.extend_from_slice(src);
                        true
                    })*
                    _ => false,
                }
            }
        }
    };
}

element_types! {
    Int8(i8) = "int8", numeric: true;
    Int16(i16) = "int16", numeric: true;
    Int32(i32) = "int32", numeric: true;
    Int64(i64) = "int64", numeric: true;
    UInt8(u8) = "uint8", numeric: true;
    UInt16(u16) = "uint16", numeric: true;
    UInt32(u32) = "uint32", numeric: true;
    UInt64(u64) = "uint64", numeric: true;
    Float32(f32) = "float32", numeric: true;
    Float64(f64) = "float64", numeric: true;
    Char(u8) = "char", numeric: false;
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for ElementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementType::from_id(s).ok_or_else(|| format!("unknown element type '{}'", s))
    }
}

impl<'a> Elements<'a> {
    /// View character data as UTF-8 text
    pub fn as_text(&self) -> Option<&'a str> {
        match *self {
            Elements::Char(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    /// Read element `index` widened to i64, for integer types
    ///
    /// Returns None for floats, characters, out-of-range indices and
    /// unsigned values above `i64::MAX`.
    pub fn get_i64(&self, index: usize) -> Option<i64> {
        match *self {
            Elements::Int8(s) => s.get(index).map(|&v| i64::from(v)),
            Elements::Int16(s) => s.get(index).map(|&v| i64::from(v)),
            Elements::Int32(s) => s.get(index).map(|&v| i64::from(v)),
            Elements::Int64(s) => s.get(index).copied(),
            Elements::UInt8(s) => s.get(index).map(|&v| i64::from(v)),
            Elements::UInt16(s) => s.get(index).map(|&v| i64::from(v)),
            Elements::UInt32(s) => s.get(index).map(|&v| i64::from(v)),
            Elements::UInt64(s) => s.get(index).and_then(|&v| i64::try_from(v).ok()),
            _ => None,
        }
    }

    /// Read element `index` as f64, for numeric types
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        match *self {
            Elements::Float32(s) => s.get(index).map(|&v| f64::from(v)),
            Elements::Float64(s) => s.get(index).copied(),
            Elements::Char(_) => None,
            _ => self.get_i64(index).map(|v| v as f64),
        }
    }
}

impl ElementBuf {
    /// Character buffer holding the UTF-8 bytes of `text`
    pub fn from_text(text: &str) -> Self {
        ElementBuf::Char(text.as_bytes().to_vec())
    }
}

impl From<Vec<i8>> for ElementBuf {
    fn from(v: Vec<i8>) -> Self {
        ElementBuf::Int8(v)
    }
}

impl From<Vec<i16>> for ElementBuf {
    fn from(v: Vec<i16>) -> Self {
        ElementBuf::Int16(v)
    }
}

impl From<Vec<i32>> for ElementBuf {
    fn from(v: Vec<i32>) -> Self {
        ElementBuf::Int32(v)
    }
}

impl From<Vec<i64>> for ElementBuf {
    fn from(v: Vec<i64>) -> Self {
        ElementBuf::Int64(v)
    }
}

impl From<Vec<u8>> for ElementBuf {
    fn from(v: Vec<u8>) -> Self {
        ElementBuf::UInt8(v)
    }
}

impl From<Vec<u16>> for ElementBuf {
    fn from(v: Vec<u16>) -> Self {
        ElementBuf::UInt16(v)
    }
}

impl From<Vec<u32>> for ElementBuf {
    fn from(v: Vec<u32>) -> Self {
        ElementBuf::UInt32(v)
    }
}

impl From<Vec<u64>> for ElementBuf {
    fn from(v: Vec<u64>) -> Self {
        ElementBuf::UInt64(v)
    }
}

impl From<Vec<f32>> for ElementBuf {
    fn from(v: Vec<f32>) -> Self {
        ElementBuf::Float32(v)
    }
}

impl From<Vec<f64>> for ElementBuf {
    fn from(v: Vec<f64>) -> Self {
        ElementBuf::Float64(v)
    }
}

// ============================================================================
// Tests
// ============================================================================
