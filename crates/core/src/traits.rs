//! Core traits at the collaborator seams
//!
//! - TreeCursor: navigation over a hierarchical configuration store
//! - ParameterSource: one adapter producing named parameters
//! - Registry: the ordered-insert hand-off to the framework's object registry

use crate::error::Result;
use crate::parameter::ParameterSet;
use crate::value::ValueView;
use std::fmt;

/// Cursor over a hierarchical store
///
/// The cursor is positioned on one node at a time. Leaves are read through
/// the node that contains them, and the views returned borrow the store
/// (`'s`), not the cursor, so they stay valid while the cursor moves on.
///
/// Absolute paths are node labels joined with `.`; the empty path is the
/// store root.
pub trait TreeCursor<'s> {
    /// Number of children of the current node
    fn child_count(&self) -> usize;

    /// Label of child `index`
    fn child_name(&self, index: usize) -> Option<&str>;

    /// Whether child `index` is a node (has children of its own)
    fn child_is_node(&self, index: usize) -> bool;

    /// Move down to child node `index`
    ///
    /// # Errors
    ///
    /// `IllegalOperation` if there is no such child or it is a leaf.
    fn move_to_child(&mut self, index: usize) -> Result<()>;

    /// Move up `generations` levels
    ///
    /// # Errors
    ///
    /// `IllegalOperation` if that would move above the root.
    fn move_to_ancestor(&mut self, generations: usize) -> Result<()>;

    /// Move to the node at an absolute path
    ///
    /// # Errors
    ///
    /// `IllegalOperation` if the path does not name a node.
    fn move_absolute(&mut self, path: &str) -> Result<()>;

    /// Absolute path of the current node
    fn current_path(&self) -> String;

    /// Read leaf `name` of the current node
    ///
    /// # Errors
    ///
    /// `IllegalOperation` if the current node has no such leaf.
    fn read_leaf(&self, name: &str) -> Result<ValueView<'s>>;

    /// Index of the child labelled `name`
    fn find_child(&self, name: &str) -> Option<usize> {
        (0..self.child_count()).find(|&i| self.child_name(i) == Some(name))
    }
}

/// Lifecycle of one adapter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SourceState {
    /// No pass has completed since construction or the last reset
    #[default]
    Unresolved,
    /// The last pass produced all parameters
    Resolved,
    /// The last pass failed; no parameters are available
    Failed,
}

impl fmt::Display for SourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceState::Unresolved => write!(f, "unresolved"),
            SourceState::Resolved => write!(f, "resolved"),
            SourceState::Failed => write!(f, "failed"),
        }
    }
}

/// One source adapter
///
/// `resolve` runs a complete pass, discarding the results of any earlier
/// pass first. `parameters` borrows the adapter, which keeps borrowed views
/// from outliving it.
pub trait ParameterSource {
    /// Loader instance name, used to qualify parameter names in the registry
    fn instance_name(&self) -> &str;

    /// Current lifecycle state
    fn state(&self) -> SourceState;

    /// Run one resolution pass
    fn resolve(&mut self) -> Result<()>;

    /// Parameters of the last successful pass
    ///
    /// # Errors
    ///
    /// `IllegalOperation` unless the adapter is `Resolved`.
    fn parameters(&self) -> Result<ParameterSet<'_>>;
}

/// Ordered-insert hand-off to the framework's global object registry
pub trait Registry {
    /// Insert one globally addressable parameter
    fn insert(&mut self, name: String, value: &ValueView<'_>) -> Result<()>;
}
