//! Composite values returned by remote sources
//!
//! A fetch from the tree database yields either a plain leaf (numeric array,
//! string) or a composite: a record with named fields or an ordered
//! collection of items. Composites nest to arbitrary depth.

use crate::element::{ElementBuf, ElementType};

/// Payload of a leaf value
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Typed elements
    Typed(ElementBuf),
    /// Source type outside the supported element set
    Unknown(String),
}

/// Terminal value with no children
///
/// `dims` are the logical extents. The data is laid out in the source's
/// orientation; the tree-database adapter decides whether it needs
/// reorienting.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    /// Logical dimension extents (empty for a scalar)
    pub dims: Vec<usize>,
    /// Element data
    pub payload: Payload,
}

impl Leaf {
    /// Leaf with explicit dims
    pub fn new(buf: impl Into<ElementBuf>, dims: Vec<usize>) -> Self {
        Leaf {
            dims,
            payload: Payload::Typed(buf.into()),
        }
    }

    /// Single-element leaf
    pub fn scalar(buf: impl Into<ElementBuf>) -> Self {
        Leaf::new(buf, Vec::new())
    }

    /// One-dimensional leaf spanning the whole buffer
    pub fn vector(buf: impl Into<ElementBuf>) -> Self {
        let buf = buf.into();
        let len = buf.len();
        Leaf::new(buf, vec![len])
    }

    /// String leaf
    pub fn text(text: &str) -> Self {
        Leaf::vector(ElementBuf::from_text(text))
    }

    /// Leaf of a type the core cannot represent
    pub fn unknown(type_name: impl Into<String>, dims: Vec<usize>) -> Self {
        Leaf {
            dims,
            payload: Payload::Unknown(type_name.into()),
        }
    }

    /// Element type, None for unknown payloads
    pub fn element_type(&self) -> Option<ElementType> {
        match &self.payload {
            Payload::Typed(buf) => Some(buf.element_type()),
            Payload::Unknown(_) => None,
        }
    }

    /// Number of elements described by the payload
    pub fn element_count(&self) -> usize {
        match &self.payload {
            Payload::Typed(buf) => buf.len(),
            Payload::Unknown(_) => self.dims.iter().product(),
        }
    }

    /// Name of the payload type for diagnostics
    pub fn type_name(&self) -> &str {
        match &self.payload {
            Payload::Typed(buf) => buf.element_type().id(),
            Payload::Unknown(name) => name,
        }
    }
}

/// Source-side value: record, ordered collection or leaf
#[derive(Debug, Clone, PartialEq)]
pub enum CompositeValue {
    /// Members addressed by field name, in declaration order
    Record(Vec<(String, CompositeValue)>),
    /// Members addressed by position
    Collection(Vec<CompositeValue>),
    /// Terminal value
    Leaf(Leaf),
}

/// Kind of a composite value, for homogeneity checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositeKind {
    /// See [`CompositeValue::Record`]
    Record,
    /// See [`CompositeValue::Collection`]
    Collection,
    /// See [`CompositeValue::Leaf`]
    Leaf,
}

impl CompositeValue {
    /// Build a record from `(field, value)` pairs
    pub fn record<K: Into<String>>(fields: impl IntoIterator<Item = (K, CompositeValue)>) -> Self {
        CompositeValue::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build a collection
    pub fn collection(items: impl IntoIterator<Item = CompositeValue>) -> Self {
        CompositeValue::Collection(items.into_iter().collect())
    }

    /// Kind of this value
    pub fn kind(&self) -> CompositeKind {
        match self {
            CompositeValue::Record(_) => CompositeKind::Record,
            CompositeValue::Collection(_) => CompositeKind::Collection,
            CompositeValue::Leaf(_) => CompositeKind::Leaf,
        }
    }

    /// Get the leaf if this is one
    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            CompositeValue::Leaf(l) => Some(l),
            _ => None,
        }
    }
}

impl From<Leaf> for CompositeValue {
    fn from(leaf: Leaf) -> Self {
        CompositeValue::Leaf(leaf)
    }
}
