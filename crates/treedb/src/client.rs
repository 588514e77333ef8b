//! Remote fetch capability
//!
//! The adapter talks to the tree database through two traits: a
//! [`TreeClient`] evaluates access expressions, a [`TreeConnector`] opens
//! clients. [`Connection`] picks the strategy:
//!
//! - `Direct`: a fresh client per resolution pass, opened from the loader's
//!   [`ClientSettings`] (local access, or a thin client when a server address
//!   is configured) and closed when the pass ends
//! - `Shared`: a client owned and managed by the caller
//!
//! `MemoryTreeClient` is an in-memory tree answering fetches the way the
//! database does, including padding and range concatenation.

use crate::expand::AccessExpression;
use rtparams_core::{CompositeValue, ElementType, Leaf, Payload};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use thiserror::Error;

/// Transport or protocol failure reported by a client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchError {
    /// Collaborator message
    pub message: String,
}

impl FetchError {
    /// Create a fetch error
    pub fn new(message: impl Into<String>) -> Self {
        FetchError {
            message: message.into(),
        }
    }
}

/// Evaluates access expressions against one open tree
pub trait TreeClient {
    /// Evaluate `expression`
    fn fetch(&mut self, expression: &AccessExpression) -> Result<CompositeValue, FetchError>;
}

/// Opens clients for a tree
pub trait TreeConnector {
    /// Open the tree described by `settings`
    fn connect(&self, settings: &ClientSettings) -> Result<Box<dyn TreeClient>, FetchError>;
}

/// How a connection reaches the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Local tree access
    Direct,
    /// Thin client to a remote server
    Thin,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::Direct => write!(f, "direct"),
            AccessMode::Thin => write!(f, "thin"),
        }
    }
}

/// Tree identification read from a loader node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClientSettings {
    /// Tree to open
    pub tree_name: String,
    /// Shot or version; -1 selects the current one
    #[serde(rename = "ShotOrVersionNumber", default = "default_shot")]
    pub shot: i64,
    /// Server for thin-client access; local access when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_address: Option<String>,
}

fn default_shot() -> i64 {
    ClientSettings::DEFAULT_SHOT
}

impl ClientSettings {
    /// Shot number selecting the current version of the tree
    pub const DEFAULT_SHOT: i64 = -1;

    /// Local access to `tree_name` at `shot`
    pub fn new(tree_name: impl Into<String>, shot: i64) -> Self {
        ClientSettings {
            tree_name: tree_name.into(),
            shot,
            server_address: None,
        }
    }

    /// Thin-client access through `server`
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server_address = Some(server.into());
        self
    }

    /// Access mode implied by the server address
    pub fn access_mode(&self) -> AccessMode {
        match self.server_address {
            Some(_) => AccessMode::Thin,
            None => AccessMode::Direct,
        }
    }
}

/// Connection strategy of a tree database adapter
pub enum Connection<'c> {
    /// Open a transient client per resolution pass
    Direct(Box<dyn TreeConnector + 'c>),
    /// Use a caller-managed client
    Shared(&'c mut dyn TreeClient),
}

impl fmt::Debug for Connection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connection::Direct(_) => write!(f, "Connection::Direct"),
            Connection::Shared(_) => write!(f, "Connection::Shared"),
        }
    }
}

/// In-memory tree database
///
/// Nodes are addressed by their full path. Every evaluated expression is
/// logged, so tests can check what was requested and in which order.
#[derive(Debug, Clone, Default)]
pub struct MemoryTreeClient {
    nodes: FxHashMap<String, CompositeValue>,
    fetches: Vec<AccessExpression>,
}

impl MemoryTreeClient {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` at `path`, replacing any previous value
    pub fn insert(&mut self, path: impl Into<String>, value: impl Into<CompositeValue>) {
        self.nodes.insert(path.into(), value.into());
    }

    /// Builder form of [`MemoryTreeClient::insert`]
    pub fn with(mut self, path: impl Into<String>, value: impl Into<CompositeValue>) -> Self {
        self.insert(path, value);
        self
    }

    /// Expressions evaluated so far, in order
    pub fn fetches(&self) -> &[AccessExpression] {
        &self.fetches
    }

    fn lookup(&self, path: &str) -> Result<&CompositeValue, FetchError> {
        self.nodes
            .get(path)
            .ok_or_else(|| FetchError::new(format!("%TREE-W-NNF, Node Not Found: {}", path)))
    }

    fn padded(&self, path: &str, target_dim: usize) -> Result<CompositeValue, FetchError> {
        let leaf = match self.lookup(path)? {
            CompositeValue::Leaf(leaf) => leaf,
            _ => return Err(FetchError::new(format!("{}: padding requires array data", path))),
        };
        let mut data = match &leaf.payload {
            Payload::Typed(buf) if buf.element_type() != ElementType::Char => buf.clone(),
            _ => {
                return Err(FetchError::new(format!(
                    "{}: padding requires numeric data, found {}",
                    path,
                    leaf.type_name()
                )))
            }
        };
        data.resize(target_dim);
        Ok(Leaf::new(data, vec![target_dim]).into())
    }
}

impl TreeClient for MemoryTreeClient {
    fn fetch(&mut self, expression: &AccessExpression) -> Result<CompositeValue, FetchError> {
        self.fetches.push(expression.clone());
        match expression {
            AccessExpression::Verbatim(path) => self.lookup(path).cloned(),
            AccessExpression::Padded { path, target_dim } => self.padded(path, *target_dim),
            AccessExpression::Concatenated(paths) => {
                let items = paths
                    .iter()
                    .map(|p| self.lookup(p).cloned())
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CompositeValue::Collection(items))
            }
        }
    }
}

/// Connector opening [`MemoryTreeClient`] copies of one named tree
#[derive(Debug)]
pub struct MemoryConnector {
    tree_name: String,
    tree: MemoryTreeClient,
    sessions: RefCell<Vec<ClientSettings>>,
}

impl MemoryConnector {
    /// Serve `tree` under `tree_name`
    pub fn new(tree_name: impl Into<String>, tree: MemoryTreeClient) -> Self {
        MemoryConnector {
            tree_name: tree_name.into(),
            tree,
            sessions: RefCell::new(Vec::new()),
        }
    }

    /// Settings of every successful connection, in order
    pub fn sessions(&self) -> Vec<ClientSettings> {
        self.sessions.borrow().clone()
    }
}

impl TreeConnector for MemoryConnector {
    fn connect(&self, settings: &ClientSettings) -> Result<Box<dyn TreeClient>, FetchError> {
        if settings.tree_name != self.tree_name {
            return Err(FetchError::new(format!(
                "%TREE-E-FOPENR, Error opening file read-only: tree '{}' shot {}",
                settings.tree_name, settings.shot
            )));
        }
        self.sessions.borrow_mut().push(settings.clone());
        Ok(Box::new(self.tree.clone()))
    }
}

impl<C: TreeConnector + ?Sized> TreeConnector for &C {
    fn connect(&self, settings: &ClientSettings) -> Result<Box<dyn TreeClient>, FetchError> {
        (**self).connect(settings)
    }
}
