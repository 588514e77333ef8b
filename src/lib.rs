//! rtparams - parameter resolution and marshalling for real-time control
//!
//! Loads named scalar, vector, matrix and structured parameters from a
//! hierarchical configuration store and from a remote tree database, and
//! exposes them as one flat namespace of self-describing values.
//!
//! # Quick Start
//!
//! ```ignore
//! use rtparams::{ConfigTree, ConfigurationAdapter, MemoryRegistry, ParameterAggregator};
//!
//! let tree = ConfigTree::parse(r#"{"Loader": {"Parameters": {"gain": 2.5}}}"#)?;
//! let mut aggregator = ParameterAggregator::new()
//!     .with(ConfigurationAdapter::new("Loader", tree.cursor(), "Loader"));
//! aggregator.resolve()?;
//!
//! let mut registry = MemoryRegistry::new();
//! aggregator.publish(&mut registry)?; // registers "Loader.gain"
//! ```
//!
//! # Architecture
//!
//! | Crate | Contents |
//! |-------|----------|
//! | `rtparams-core` | values, element types, errors, collaborator traits |
//! | `rtparams-marshal` | array reorientation, composite decomposition |
//! | `rtparams-config` | configuration store, tree flattening, configuration adapter |
//! | `rtparams-treedb` | path expansion, fetch capability, tree database adapter |
//! | `rtparams-engine` | aggregation and registry hand-off |

pub use rtparams_config::{
    flatten, normalise_name, ConfigCursor, ConfigTree, ConfigurationAdapter, LeafVisitor,
};
pub use rtparams_core::*;
pub use rtparams_engine::{MemoryRegistry, ParameterAggregator};
pub use rtparams_marshal::{
    column_major_to_row_major, corner_turn, decompose, transpose_and_copy, DecomposedLeaf,
    MarshalError,
};
pub use rtparams_treedb::{
    expand, AccessExpression, AccessMode, ClientSettings, Connection, Expansion, FetchError,
    LeafDeclaration, MemoryConnector, MemoryTreeClient, TreeClient, TreeConnector,
    TreeDatabaseAdapter,
};
