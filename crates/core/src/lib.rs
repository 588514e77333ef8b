//! Core types and traits for rtparams
//!
//! This crate defines the foundational types used throughout the system:
//! - ElementType / Elements / ElementBuf: the closed set of primitive element types
//! - Shape: up to three dimension extents
//! - ValueView: self-describing, ownership-tagged handle to a parameter's data
//! - NamedParameter / ParameterSet: the flat namespace handed to the registry
//! - CompositeValue: records, collections and leaves returned by remote sources
//! - Orientation: row-major / column-major source layout
//! - Error: error taxonomy
//! - Traits: TreeCursor, ParameterSource, Registry

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod composite;
pub mod element;
pub mod error;
pub mod limits;
pub mod orientation;
pub mod parameter;
pub mod traits;
pub mod value;

pub use composite::{CompositeKind, CompositeValue, Leaf, Payload};
pub use element::{ElementBuf, ElementType, Elements};
pub use error::{Error, ErrorKind, Result};
pub use limits::{Shape, ShapeError, MAX_DIMENSIONS};
pub use orientation::Orientation;
pub use parameter::{join_field, join_index, NamedParameter, ParameterSet};
pub use traits::{ParameterSource, Registry, SourceState, TreeCursor};
pub use value::{Buffer, Ownership, ValueView, UNLINKED_ELEMENT_TYPE};
