//! Iterative tree flattening
//!
//! Walks every descendant of a root node and hands each leaf to a
//! [`LeafVisitor`] under its dot-joined name relative to the root. The walk
//! keeps an explicit stack of pending nodes, so depth is bounded by memory
//! rather than by the call stack.
//!
//! Children of each node are examined in declaration order. Leaves (and nodes
//! the visitor claims as terminal) are visited immediately; other nodes are
//! pushed and expanded later. Pending nodes are popped last-in first-out, so
//! the children of sibling nodes come out in reverse sibling order.
//!
//! Only the root is reached by absolute path. Every pending node is a child
//! of a node on the cursor's current path, so each later step is a relative
//! move up to that parent and down one level.

use rtparams_core::{join_field, Error, Result, TreeCursor};
use tracing::trace;

/// Receives the leaves found by [`flatten`]
pub trait LeafVisitor<C: ?Sized> {
    /// Whether node child `index` of the current node is visited as a unit
    /// instead of being descended into
    fn is_terminal(&mut self, _cursor: &mut C, _index: usize) -> Result<bool> {
        Ok(false)
    }

    /// Visit child `index` of the current node
    ///
    /// `name` is the normalised dot-joined name relative to the flattening
    /// root. The cursor must be left on the parent node.
    fn visit(&mut self, cursor: &mut C, index: usize, label: &str, name: String) -> Result<()>;
}

/// Replace every `-` with `.`
pub fn normalise_name(name: &str) -> String {
    name.replace('-', ".")
}

/// Flatten the subtree at absolute path `root`
///
/// Returns the number of visited leaves.
///
/// # Errors
///
/// `IllegalOperation` if `root` (or a node found below it) cannot be reached;
/// any error returned by the visitor aborts the walk.
pub fn flatten<'s, C, V>(cursor: &mut C, root: &str, visitor: &mut V) -> Result<usize>
where
    C: TreeCursor<'s> + ?Sized,
    V: LeafVisitor<C> + ?Sized,
{
    cursor.move_absolute(root)?;
    let mut pending = Vec::new();
    let mut depth = 0;
    let mut visited = expand(cursor, visitor, depth, "", &mut pending)?;

    while let Some(node) = pending.pop() {
        cursor.move_to_ancestor(depth - node.parent_depth)?;
        cursor.move_to_child(node.index)?;
        depth = node.parent_depth + 1;
        visited += expand(cursor, visitor, depth, &node.name, &mut pending)?;
    }

    Ok(visited)
}

/// Node waiting to be expanded, addressed from its parent
struct Pending {
    parent_depth: usize,
    index: usize,
    name: String,
}

/// Visit the leaves of the current node and queue its child nodes
fn expand<'s, C, V>(
    cursor: &mut C,
    visitor: &mut V,
    depth: usize,
    prefix: &str,
    pending: &mut Vec<Pending>,
) -> Result<usize>
where
    C: TreeCursor<'s> + ?Sized,
    V: LeafVisitor<C> + ?Sized,
{
    trace!(target: "rtparams::config", node = %prefix, depth, "Flattening node");
    let mut visited = 0;

    for index in 0..cursor.child_count() {
        let label = match cursor.child_name(index) {
            Some(label) => label.to_string(),
            None => {
                return Err(Error::illegal(
                    cursor.current_path(),
                    format!("no child at index {}", index),
                ))
            }
        };
        let name = normalise_name(&join_field(prefix, &label));

        if cursor.child_is_node(index) && !visitor.is_terminal(cursor, index)? {
            pending.push(Pending {
                parent_depth: depth,
                index,
                name,
            });
        } else {
            visitor.visit(cursor, index, &label, name)?;
            visited += 1;
        }
    }

    Ok(visited)
}
