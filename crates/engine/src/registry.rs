//! In-memory parameter registry
//!
//! Stores published parameters as owned copies under their qualified names,
//! in insertion order. Names are unique; inserting a name twice fails.

use rtparams_core::{Error, Registry, Result, ValueView};
use rustc_hash::FxHashMap;

/// Registry holding owned copies of published parameters
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    entries: Vec<(String, ValueView<'static>)>,
    index: FxHashMap<String, usize>,
}

impl MemoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered parameters
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing has been registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a parameter by qualified name
    pub fn get(&self, name: &str) -> Option<&ValueView<'static>> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    /// Qualified names in insertion order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Iterate over `(name, value)` in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValueView<'static>)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl Registry for MemoryRegistry {
    fn insert(&mut self, name: String, value: &ValueView<'_>) -> Result<()> {
        if self.index.contains_key(&name) {
            return Err(Error::illegal(name, "name is already registered"));
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, value.clone().into_owned()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtparams_core::{ElementBuf, ErrorKind, Ownership, Shape};

    #[test]
    fn test_insert_copies_views() {
        let data = ElementBuf::from(vec![1.0f64, 2.0]);
        let view = ValueView::view(data.as_elements(), Shape::vector(2)).unwrap();

        let mut registry = MemoryRegistry::new();
        registry.insert("A.x".to_string(), &view).unwrap();
        drop(view);
        drop(data);

        let stored = registry.get("A.x").unwrap();
        assert_eq!(stored.ownership(), Some(Ownership::Owned));
        assert_eq!(stored.len(), 2);
        assert_eq!(registry.names(), vec!["A.x"]);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = MemoryRegistry::new();
        let view = ValueView::unlinked(rtparams_core::UNLINKED_ELEMENT_TYPE);
        registry.insert("A.x".to_string(), &view).unwrap();
        let err = registry.insert("A.x".to_string(), &view).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalOperation);
        assert_eq!(err.name(), "A.x");
        assert_eq!(registry.len(), 1);
    }
}
