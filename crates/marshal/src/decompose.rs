//! Decomposition of composite values into named leaves
//!
//! Records contribute `parent.field`, collections contribute `parent[i]`,
//! and every reachable leaf becomes one output entry. The walk uses an
//! explicit work stack, so nesting depth is bounded only by memory.
//!
//! Collections must be homogeneous: all records, or all collections. A
//! collection made only of leaves is one array value, stacked along a new
//! outer dimension. Anything else is `UnsupportedFeature`.

use rtparams_core::{
    join_field, join_index, CompositeKind, CompositeValue, ElementBuf, Error, Leaf, Orientation,
    Payload, Result, MAX_DIMENSIONS, UNLINKED_ELEMENT_TYPE,
};
use tracing::{debug, warn};

/// One named leaf produced by decomposition
#[derive(Debug, Clone, PartialEq)]
pub struct DecomposedLeaf {
    /// Dotted/indexed parameter name
    pub name: String,
    /// The leaf, moved out of the composite
    pub leaf: Leaf,
}

impl DecomposedLeaf {
    /// A leaf with no elements is declared but unlinked
    pub fn is_linked(&self) -> bool {
        self.leaf.element_count() > 0
    }
}

/// Decompose `value` into named leaves, depth-first in declaration order
///
/// `orientation` is the layout of the source data; it decides along which
/// end a collection of leaves is stacked so that each item stays contiguous.
///
/// # Errors
///
/// `UnsupportedFeature` for inhomogeneous collections and for leaves with
/// more than [`MAX_DIMENSIONS`] dimensions.
pub fn decompose(
    name: &str,
    value: CompositeValue,
    orientation: Orientation,
) -> Result<Vec<DecomposedLeaf>> {
    let mut out = Vec::new();
    let mut stack: Vec<(String, CompositeValue)> = vec![(name.to_string(), value)];

    while let Some((name, value)) = stack.pop() {
        match value {
            CompositeValue::Leaf(leaf) => emit(&mut out, name, leaf)?,
            CompositeValue::Record(fields) => {
                for (field, member) in fields.into_iter().rev() {
                    stack.push((join_field(&name, &field), member));
                }
            }
            CompositeValue::Collection(items) => match collection_kind(&name, &items)? {
                None => emit(&mut out, name, empty_leaf())?,
                Some(CompositeKind::Leaf) => {
                    let leaves = items
                        .into_iter()
                        .filter_map(|item| match item {
                            CompositeValue::Leaf(leaf) => Some(leaf),
                            _ => None,
                        })
                        .collect();
                    let stacked = stack_leaves(&name, leaves, orientation)?;
                    emit(&mut out, name, stacked)?;
                }
                Some(_) => {
                    for (index, item) in items.into_iter().enumerate().rev() {
                        stack.push((join_index(&name, index), item));
                    }
                }
            },
        }
    }

    Ok(out)
}

fn emit(out: &mut Vec<DecomposedLeaf>, name: String, leaf: Leaf) -> Result<()> {
    if leaf.dims.len() > MAX_DIMENSIONS {
        return Err(Error::unsupported(
            name,
            format!(
                "{} dimensions exceed the maximum of {}",
                leaf.dims.len(),
                MAX_DIMENSIONS
            ),
        ));
    }
    let entry = DecomposedLeaf { name, leaf };
    if entry.is_linked() {
        debug!(target: "rtparams::marshal", parameter = %entry.name, ty = entry.leaf.type_name(), "Leaf decomposed");
    } else {
        warn!(target: "rtparams::marshal", parameter = %entry.name, "Unlinked parameter: no backing data");
    }
    out.push(entry);
    Ok(())
}

fn empty_leaf() -> Leaf {
    Leaf::new(ElementBuf::with_capacity(UNLINKED_ELEMENT_TYPE, 0), vec![0])
}

/// Common kind of the items, None for an empty collection
fn collection_kind(name: &str, items: &[CompositeValue]) -> Result<Option<CompositeKind>> {
    let mut kinds = items.iter().map(CompositeValue::kind);
    let first = match kinds.next() {
        Some(k) => k,
        None => return Ok(None),
    };
    if let Some(other) = kinds.find(|&k| k != first) {
        let reason = if first == CompositeKind::Leaf || other == CompositeKind::Leaf {
            "collection mixes plain leaves with composite items"
        } else {
            "collection mixes record-like and list-like items"
        };
        return Err(Error::unsupported(name, reason));
    }
    Ok(Some(first))
}

/// Stack equally-shaped leaves into one array
fn stack_leaves(name: &str, leaves: Vec<Leaf>, orientation: Orientation) -> Result<Leaf> {
    let count = leaves.len();
    let item_dims = leaves[0].dims.clone();
    let dims: Vec<usize> = match orientation {
        Orientation::RowMajor => std::iter::once(count)
            .chain(item_dims.iter().copied())
            .collect(),
        Orientation::ColumnMajor => item_dims
            .iter()
            .copied()
            .chain(std::iter::once(count))
            .collect(),
    };
    if dims.len() > MAX_DIMENSIONS {
        return Err(Error::unsupported(
            name,
            format!(
                "stacking {} items of {} dimensions exceeds the maximum of {}",
                count,
                item_dims.len(),
                MAX_DIMENSIONS
            ),
        ));
    }

    for (index, leaf) in leaves.iter().enumerate() {
        if leaf.dims != item_dims {
            return Err(Error::unsupported(
                join_index(name, index),
                format!("item dims {:?} differ from {:?}", leaf.dims, item_dims),
            ));
        }
    }

    let mut stacked = match &leaves[0].payload {
        Payload::Typed(first) => {
            ElementBuf::with_capacity(first.element_type(), first.len() * count)
        }
        Payload::Unknown(type_name) => {
            if let Some(index) = leaves.iter().position(|l| l.type_name() != type_name.as_str()) {
                return Err(Error::unsupported(
                    join_index(name, index),
                    format!("item type {} differs from {}", leaves[index].type_name(), type_name),
                ));
            }
            return Ok(Leaf::unknown(type_name.clone(), dims));
        }
    };

    for (index, leaf) in leaves.iter().enumerate() {
        let appended = match &leaf.payload {
            Payload::Typed(buf) => stacked.extend_from(buf.as_elements()),
            Payload::Unknown(_) => false,
        };
        if !appended {
            return Err(Error::unsupported(
                join_index(name, index),
                format!(
                    "item type {} differs from {}",
                    leaf.type_name(),
                    stacked.element_type()
                ),
            ));
        }
    }

    Ok(Leaf::new(stacked, dims))
}
