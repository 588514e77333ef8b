//! Parameter aggregation and registry hand-off
//!
//! `ParameterAggregator` resolves an ordered list of parameter sources as one
//! unit and publishes the merged parameters under instance-qualified names.
//! `MemoryRegistry` is an in-memory registry for embedding and tests.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregator;
pub mod registry;

pub use aggregator::{ParameterAggregator, AGGREGATOR_NAME};
pub use registry::MemoryRegistry;
