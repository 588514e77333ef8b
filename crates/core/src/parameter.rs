//! Named parameters and the enumeration handed to the registry
//!
//! Parameter names are dotted: ancestor node names joined with `.`, array
//! items addressed as `[i]`. The core does not enforce uniqueness.

use crate::value::ValueView;
use std::borrow::Cow;

/// One resolved parameter
#[derive(Debug, Clone, PartialEq)]
pub struct NamedParameter<'a> {
    /// Dotted parameter name
    pub name: String,
    /// Resolved data
    pub value: ValueView<'a>,
}

impl<'a> NamedParameter<'a> {
    /// Create a named parameter
    pub fn new(name: impl Into<String>, value: ValueView<'a>) -> Self {
        NamedParameter {
            name: name.into(),
            value,
        }
    }
}

/// Join a parent name and a field label with `.`
///
/// An empty parent yields the label alone.
pub fn join_field(parent: &str, field: &str) -> String {
    if parent.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", parent, field)
    }
}

/// Append an `[index]` suffix to a parent name
pub fn join_index(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

/// Ordered parameters of one resolution pass
///
/// The set borrows the adapter that produced it: entries the adapter stores
/// are handed out by reference, views it builds on demand (over its retained
/// fetch results) are held here. Either way nothing in the set outlives the
/// adapter or survives its re-resolution.
#[derive(Debug, Clone, Default)]
pub struct ParameterSet<'a> {
    entries: Vec<Cow<'a, NamedParameter<'a>>>,
}

impl<'a> ParameterSet<'a> {
    /// Create an empty set
    pub fn new() -> Self {
        ParameterSet {
            entries: Vec::new(),
        }
    }

    /// Create an empty set with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        ParameterSet {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Append a parameter stored by the producer
    pub fn push_ref(&mut self, parameter: &'a NamedParameter<'a>) {
        self.entries.push(Cow::Borrowed(parameter));
    }

    /// Append a parameter built for this set
    pub fn push(&mut self, parameter: NamedParameter<'a>) {
        self.entries.push(Cow::Owned(parameter));
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name of parameter `index`
    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|p| p.name.as_str())
    }

    /// Value of parameter `index`
    pub fn value_at(&self, index: usize) -> Option<&ValueView<'a>> {
        self.entries.get(index).map(|p| &p.value)
    }

    /// Look up a parameter by name (first match)
    pub fn get(&self, name: &str) -> Option<&ValueView<'a>> {
        self.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    /// Iterate in resolution order
    pub fn iter(&self) -> impl Iterator<Item = &NamedParameter<'a>> {
        self.entries.iter().map(|p| &**p)
    }

    /// Parameter names in resolution order
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|p| p.name.as_str()).collect()
    }
}
