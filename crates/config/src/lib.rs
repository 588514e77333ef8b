//! Hierarchical configuration sources
//!
//! - `tree`: in-process hierarchical store built from JSON documents
//! - `flatten`: iterative hierarchical-to-flat name flattening
//! - `adapter`: parameter source over a store's `Parameters` subtree

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapter;
pub mod flatten;
pub mod tree;

pub use adapter::{ConfigurationAdapter, PARAMETERS_NODE};
pub use flatten::{flatten, normalise_name, LeafVisitor};
pub use tree::{ConfigCursor, ConfigTree};
