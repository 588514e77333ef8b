//! Array marshalling and composite decomposition
//!
//! - `transpose`: corner-turn numeric arrays into row-major order
//! - `decompose`: expand records and collections into named leaves

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod decompose;
pub mod transpose;

pub use decompose::{decompose, DecomposedLeaf};
pub use transpose::{column_major_to_row_major, corner_turn, transpose_and_copy, MarshalError};
