//! Tree database parameter source
//!
//! - `declaration`: leaf declarations and loader settings read from configuration
//! - `expand`: path templates to access expressions
//! - `client`: fetch capability, connection strategies and an in-memory tree
//! - `adapter`: the resolution pass tying it together

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapter;
pub mod client;
pub mod declaration;
pub mod expand;

pub use adapter::TreeDatabaseAdapter;
pub use client::{
    AccessMode, ClientSettings, Connection, FetchError, MemoryConnector, MemoryTreeClient,
    TreeClient, TreeConnector,
};
pub use declaration::LeafDeclaration;
pub use expand::{expand, AccessExpression, Expansion, INDEX_PLACEHOLDER};
