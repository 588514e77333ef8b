//! In-process hierarchical configuration store
//!
//! `ConfigTree` holds a tree of named nodes whose leaves are typed arrays. It
//! is built from a `serde_json::Value` document (object members keep their
//! declaration order) or assembled programmatically, and navigated through
//! `ConfigCursor`, which implements [`TreeCursor`].
//!
//! ## JSON mapping
//!
//! | JSON | Leaf |
//! |------|------|
//! | integer | int64 scalar (uint64 above `i64::MAX`) |
//! | float | float64 scalar |
//! | bool | uint8 scalar (0/1) |
//! | string | char vector |
//! | array of numbers, up to 3 levels deep | int64/uint64/float64 array |
//! | null | scalar with unresolved element type |
//! | object | node |
//!
//! Arrays must be rectangular; arrays of strings, objects or mixed items are
//! rejected with `UnsupportedFeature`. Node labels must be non-empty and must
//! not contain `.`, which separates labels in absolute paths.

use rtparams_core::{
    join_field, ElementBuf, Error, Result, Shape, TreeCursor, ValueView, MAX_DIMENSIONS,
};
use serde_json::{Number, Value};

#[derive(Debug, Clone, PartialEq)]
struct LeafValue {
    shape: Shape,
    data: Option<ElementBuf>,
}

#[derive(Debug, Clone, PartialEq)]
enum ConfigNode {
    Branch(Vec<(String, ConfigNode)>),
    Leaf(LeafValue),
}

/// Hierarchical configuration store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTree {
    root: Vec<(String, ConfigNode)>,
}

fn check_label(path: &str, label: &str) -> Result<()> {
    if label.is_empty() || label.contains('.') {
        return Err(Error::parameters(
            path,
            format!("invalid node label '{}': labels must be non-empty and contain no '.'", label),
        ));
    }
    Ok(())
}

impl ConfigTree {
    /// Create an empty store
    pub fn new() -> Self {
        ConfigTree { root: Vec::new() }
    }

    /// Parse a JSON document whose top level is an object
    pub fn parse(text: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(text)
            .map_err(|e| Error::parameters("<document>", e.to_string()))?;
        ConfigTree::from_json(&document)
    }

    /// Build from a JSON value whose top level is an object
    pub fn from_json(document: &Value) -> Result<Self> {
        match document {
            Value::Object(members) => Ok(ConfigTree {
                root: branch_from_json("", members)?,
            }),
            _ => Err(Error::parameters(
                "<document>",
                "configuration document must be an object",
            )),
        }
    }

    /// Insert a typed leaf at `path`, creating intermediate nodes
    ///
    /// # Errors
    ///
    /// - `IllegalOperation` if an intermediate label names a leaf or the leaf exists
    /// - `Parameters` for an invalid label
    /// - `UnsupportedFeature` / `InternalSetup` if `dims` is invalid for `data`
    pub fn insert(&mut self, path: &str, data: ElementBuf, dims: &[usize]) -> Result<()> {
        let shape = Shape::new(dims).map_err(|e| Error::from_shape(path, e))?;
        shape
            .check_len(data.len())
            .map_err(|e| Error::from_shape(path, e))?;

        let labels: Vec<&str> = path.split('.').collect();
        for label in &labels {
            check_label(path, label)?;
        }
        let (leaf_label, parents) = match labels.split_last() {
            Some(split) => split,
            None => return Err(Error::parameters(path, "empty path")),
        };

        let mut children = &mut self.root;
        for label in parents {
            let index = match children.iter().position(|(l, _)| l == label) {
                Some(i) => i,
                None => {
                    children.push((label.to_string(), ConfigNode::Branch(Vec::new())));
                    children.len() - 1
                }
            };
            children = match &mut children[index].1 {
                ConfigNode::Branch(c) => c,
                ConfigNode::Leaf(_) => {
                    return Err(Error::illegal(path, format!("'{}' is a leaf, not a node", label)))
                }
            };
        }

        if children.iter().any(|(l, _)| l == leaf_label) {
            return Err(Error::illegal(path, "entry already exists"));
        }
        children.push((
            leaf_label.to_string(),
            ConfigNode::Leaf(LeafValue {
                shape,
                data: Some(data),
            }),
        ));
        Ok(())
    }

    /// Insert a string leaf at `path`
    pub fn insert_text(&mut self, path: &str, text: &str) -> Result<()> {
        self.insert(path, ElementBuf::from_text(text), &[text.len()])
    }

    /// Cursor positioned at the root
    pub fn cursor(&self) -> ConfigCursor<'_> {
        ConfigCursor {
            tree: self,
            stack: Vec::new(),
        }
    }
}

// Tear down iteratively; deep chains would otherwise recurse once per level.
impl Drop for ConfigTree {
    fn drop(&mut self) {
        let mut pending: Vec<ConfigNode> = self.root.drain(..).map(|(_, node)| node).collect();
        while let Some(node) = pending.pop() {
            if let ConfigNode::Branch(children) = node {
                pending.extend(children.into_iter().map(|(_, node)| node));
            }
        }
    }
}

fn branch_from_json(
    path: &str,
    members: &serde_json::Map<String, Value>,
) -> Result<Vec<(String, ConfigNode)>> {
    let mut children = Vec::with_capacity(members.len());
    for (label, value) in members {
        check_label(path, label)?;
        let child_path = join_field(path, label);
        let node = match value {
            Value::Object(inner) => ConfigNode::Branch(branch_from_json(&child_path, inner)?),
            other => ConfigNode::Leaf(leaf_from_json(&child_path, other)?),
        };
        children.push((label.clone(), node));
    }
    Ok(children)
}

fn leaf_from_json(path: &str, value: &Value) -> Result<LeafValue> {
    let leaf = match value {
        Value::Null => LeafValue {
            shape: Shape::scalar(),
            data: None,
        },
        Value::Bool(b) => LeafValue {
            shape: Shape::scalar(),
            data: Some(ElementBuf::UInt8(vec![u8::from(*b)])),
        },
        Value::Number(n) => LeafValue {
            shape: Shape::scalar(),
            data: Some(numeric_buf(&[n])),
        },
        Value::String(s) => LeafValue {
            shape: Shape::vector(s.len()),
            data: Some(ElementBuf::from_text(s)),
        },
        Value::Array(items) => {
            let mut dims = Vec::new();
            let mut numbers = Vec::new();
            collect_numbers(path, items, 0, &mut dims, &mut numbers)?;
            let shape = Shape::new(&dims).map_err(|e| Error::from_shape(path, e))?;
            LeafValue {
                shape,
                data: Some(numeric_buf(&numbers)),
            }
        }
        Value::Object(_) => return Err(Error::illegal(path, "object is not a leaf")),
    };
    Ok(leaf)
}

fn collect_numbers<'v>(
    path: &str,
    items: &'v [Value],
    depth: usize,
    dims: &mut Vec<usize>,
    out: &mut Vec<&'v Number>,
) -> Result<()> {
    if depth >= MAX_DIMENSIONS {
        return Err(Error::unsupported(
            path,
            format!("arrays nest deeper than {} levels", MAX_DIMENSIONS),
        ));
    }
    if dims.len() == depth {
        dims.push(items.len());
    } else if dims[depth] != items.len() {
        return Err(Error::unsupported(path, "array is not rectangular"));
    }

    if items.iter().all(Value::is_number) {
        if dims.len() != depth + 1 {
            return Err(Error::unsupported(path, "array is not rectangular"));
        }
        out.extend(items.iter().filter_map(|v| match v {
            Value::Number(n) => Some(n),
            _ => None,
        }));
        Ok(())
    } else if items.iter().all(Value::is_array) {
        for item in items {
            if let Value::Array(inner) = item {
                collect_numbers(path, inner, depth + 1, dims, out)?;
            }
        }
        Ok(())
    } else {
        Err(Error::unsupported(
            path,
            "array items must be all numbers or all arrays",
        ))
    }
}

fn numeric_buf(numbers: &[&Number]) -> ElementBuf {
    if numbers.iter().all(|n| n.is_i64()) {
        ElementBuf::Int64(numbers.iter().filter_map(|n| n.as_i64()).collect())
    } else if numbers.iter().all(|n| n.is_u64()) {
        ElementBuf::UInt64(numbers.iter().filter_map(|n| n.as_u64()).collect())
    } else {
        ElementBuf::Float64(
            numbers
                .iter()
                .map(|n| n.as_f64().unwrap_or(f64::NAN))
                .collect(),
        )
    }
}

/// Cursor over a [`ConfigTree`]
#[derive(Debug, Clone)]
pub struct ConfigCursor<'s> {
    tree: &'s ConfigTree,
    stack: Vec<(&'s str, &'s [(String, ConfigNode)])>,
}

impl<'s> ConfigCursor<'s> {
    fn children(&self) -> &'s [(String, ConfigNode)] {
        match self.stack.last() {
            Some(&(_, children)) => children,
            None => &self.tree.root,
        }
    }

    /// Depth of the current node (0 at the root)
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

impl<'s> TreeCursor<'s> for ConfigCursor<'s> {
    fn child_count(&self) -> usize {
        self.children().len()
    }

    fn child_name(&self, index: usize) -> Option<&str> {
        self.children().get(index).map(|(label, _)| label.as_str())
    }

    fn child_is_node(&self, index: usize) -> bool {
        matches!(self.children().get(index), Some((_, ConfigNode::Branch(_))))
    }

    fn move_to_child(&mut self, index: usize) -> Result<()> {
        match self.children().get(index) {
            Some((label, ConfigNode::Branch(children))) => {
                self.stack.push((label.as_str(), children.as_slice()));
                Ok(())
            }
            Some((label, ConfigNode::Leaf(_))) => Err(Error::illegal(
                join_field(&self.current_path(), label),
                "is a leaf, not a node",
            )),
            None => Err(Error::illegal(
                self.current_path(),
                format!("no child at index {}", index),
            )),
        }
    }

    fn move_to_ancestor(&mut self, generations: usize) -> Result<()> {
        if generations > self.stack.len() {
            return Err(Error::illegal(
                self.current_path(),
                format!("cannot move up {} levels", generations),
            ));
        }
        self.stack.truncate(self.stack.len() - generations);
        Ok(())
    }

    fn move_absolute(&mut self, path: &str) -> Result<()> {
        let mut stack = Vec::new();
        if !path.is_empty() {
            let mut children: &'s [(String, ConfigNode)] = &self.tree.root;
            for label in path.split('.') {
                match children.iter().find(|(l, _)| l == label) {
                    Some((l, ConfigNode::Branch(inner))) => {
                        stack.push((l.as_str(), inner.as_slice()));
                        children = inner;
                    }
                    _ => return Err(Error::illegal(path, "no such node")),
                }
            }
        }
        self.stack = stack;
        Ok(())
    }

    fn current_path(&self) -> String {
        self.stack
            .iter()
            .map(|(label, _)| *label)
            .collect::<Vec<_>>()
            .join(".")
    }

    fn read_leaf(&self, name: &str) -> Result<ValueView<'s>> {
        let full = join_field(&self.current_path(), name);
        match self.children().iter().find(|(label, _)| label == name) {
            Some((_, ConfigNode::Leaf(leaf))) => match &leaf.data {
                Some(data) => ValueView::view(data.as_elements(), leaf.shape.clone())
                    .map_err(|e| Error::from_shape(full, e)),
                None => Ok(ValueView::unresolved(leaf.shape.clone())),
            },
            Some((_, ConfigNode::Branch(_))) => Err(Error::illegal(full, "is a node, not a leaf")),
            None => Err(Error::illegal(full, "no such leaf")),
        }
    }
}
