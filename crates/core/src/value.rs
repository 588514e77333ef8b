//! Value views for resolved parameters
//!
//! This module defines:
//! - ValueView: self-describing handle to one parameter's data
//! - Buffer: the ownership-tagged data behind a view
//! - Ownership: whether the data is borrowed or owned
//!
//! ## Ownership
//!
//! A `Buffer::View` borrows storage owned by someone else (the configuration
//! store, or the fetch results an adapter retains). Its lifetime parameter
//! ties it to that storage, so a view cannot outlive the adapter that produced
//! it. A `Buffer::Owned` holds a buffer allocated during resolution, e.g. the
//! row-major copy made by the array marshaller.
//!
//! ## Linking
//!
//! An unlinked view was declared but is backed by no data. It has no buffer
//! and a zero-sized shape. Views with an unresolved element type are linked
//! but carry no buffer either: the source value could not be mapped onto the
//! closed element type set.

use crate::element::{ElementBuf, ElementType, Elements};
use crate::limits::{Shape, ShapeError};
use std::fmt;

/// Element type given to unlinked parameters whose source declares none
pub const UNLINKED_ELEMENT_TYPE: ElementType = ElementType::Float64;

/// Ownership tag of a view's data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ownership {
    /// View into externally-owned storage
    Borrowed,
    /// Buffer allocated during resolution
    Owned,
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ownership::Borrowed => write!(f, "borrowed"),
            Ownership::Owned => write!(f, "owned"),
        }
    }
}

/// Data behind a value view
#[derive(Debug, Clone, PartialEq)]
pub enum Buffer<'a> {
    /// Lifetime-bound view into storage owned elsewhere
    View(Elements<'a>),
    /// Buffer allocated during resolution
    Owned(ElementBuf),
}

impl<'a> Buffer<'a> {
    /// Typed slice over the data, whichever way it is held
    pub fn elements(&self) -> Elements<'_> {
        match self {
            Buffer::View(e) => *e,
            Buffer::Owned(b) => b.as_elements(),
        }
    }

    /// Ownership tag
    pub fn ownership(&self) -> Ownership {
        match self {
            Buffer::View(_) => Ownership::Borrowed,
            Buffer::Owned(_) => Ownership::Owned,
        }
    }
}

/// Self-describing handle to one resolved parameter's data
#[derive(Debug, Clone, PartialEq)]
pub struct ValueView<'a> {
    element_type: Option<ElementType>,
    shape: Shape,
    buffer: Option<Buffer<'a>>,
    linked: bool,
}

impl<'a> ValueView<'a> {
    /// Borrowed view over `elements` with the given shape
    pub fn view(elements: Elements<'a>, shape: Shape) -> Result<Self, ShapeError> {
        shape.check_len(elements.len())?;
        Ok(ValueView {
            element_type: Some(elements.element_type()),
            shape,
            buffer: Some(Buffer::View(elements)),
            linked: true,
        })
    }

    /// Owned view over `buf` with the given shape
    pub fn owned(buf: ElementBuf, shape: Shape) -> Result<Self, ShapeError> {
        shape.check_len(buf.len())?;
        Ok(ValueView {
            element_type: Some(buf.element_type()),
            shape,
            buffer: Some(Buffer::Owned(buf)),
            linked: true,
        })
    }

    /// Declared parameter with no backing data
    pub fn unlinked(element_type: ElementType) -> Self {
        ValueView {
            element_type: Some(element_type),
            shape: Shape::vector(0),
            buffer: None,
            linked: false,
        }
    }

    /// Linked value whose element type could not be resolved
    pub fn unresolved(shape: Shape) -> Self {
        ValueView {
            element_type: None,
            shape,
            buffer: None,
            linked: true,
        }
    }

    /// Element type, or None when unresolved
    pub fn element_type(&self) -> Option<ElementType> {
        self.element_type
    }

    /// Dimension extents
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Whether the view is backed by source data
    pub fn is_linked(&self) -> bool {
        self.linked
    }

    /// Ownership tag of the data, None when there is no data
    pub fn ownership(&self) -> Option<Ownership> {
        self.buffer.as_ref().map(Buffer::ownership)
    }

    /// The data, if any
    pub fn buffer(&self) -> Option<&Buffer<'a>> {
        self.buffer.as_ref()
    }

    /// Typed slice over the data, if any
    pub fn elements(&self) -> Option<Elements<'_>> {
        self.buffer.as_ref().map(|b| b.elements())
    }

    /// Number of elements held (0 when unlinked or unresolved)
    pub fn len(&self) -> usize {
        self.elements().map_or(0, |e| e.len())
    }

    /// Check if the view holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the data in bytes
    pub fn byte_size(&self) -> usize {
        self.element_type.map_or(0, |t| t.size_of() * self.len())
    }

    /// Character data as text
    pub fn as_text(&self) -> Option<&str> {
        self.elements().and_then(|e| e.as_text())
    }

    /// Scalar integer value (a one-element integer view)
    pub fn as_i64(&self) -> Option<i64> {
        match self.elements() {
            Some(e) if e.len() == 1 => e.get_i64(0),
            _ => None,
        }
    }

    /// Scalar numeric value as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self.elements() {
            Some(e) if e.len() == 1 => e.get_f64(0),
            _ => None,
        }
    }

    /// Detach from borrowed storage by copying a `View` into an owned buffer
    pub fn into_owned(self) -> ValueView<'static> {
        let buffer = self.buffer.map(|b| match b {
            Buffer::View(e) => Buffer::Owned(e.to_buf()),
            Buffer::Owned(buf) => Buffer::Owned(buf),
        });
        ValueView {
            element_type: self.element_type,
            shape: self.shape,
            buffer,
            linked: self.linked,
        }
    }
}

impl fmt::Display for ValueView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ty = self.element_type.map_or("unresolved", |t| t.id());
        if !self.linked {
            return write!(f, "{} (unlinked)", ty);
        }
        match self.ownership() {
            Some(o) => write!(f, "{}{} ({})", ty, self.shape, o),
            None => write!(f, "{}{}", ty, self.shape),
        }
    }
}
