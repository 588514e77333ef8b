//! Configuration adapter
//!
//! Exposes the literal leaves under `<root>.Parameters` of a hierarchical
//! store. Values are never copied: each parameter is a view borrowing the
//! store, so the store must outlive the adapter.

use crate::flatten::{flatten, LeafVisitor};
use rtparams_core::{
    join_field, Error, NamedParameter, ParameterSet, ParameterSource, Result, SourceState,
    TreeCursor,
};
use tracing::{debug, info, warn};

/// Name of the subtree holding parameter leaves
pub const PARAMETERS_NODE: &str = "Parameters";

/// Parameter source backed by a hierarchical configuration store
#[derive(Debug)]
pub struct ConfigurationAdapter<'s, C> {
    instance_name: String,
    cursor: C,
    root: String,
    state: SourceState,
    parameters: Vec<NamedParameter<'s>>,
}

struct Collector<'s> {
    out: Vec<NamedParameter<'s>>,
}

impl<'s, C: TreeCursor<'s> + ?Sized> LeafVisitor<C> for Collector<'s> {
    fn visit(&mut self, cursor: &mut C, _index: usize, label: &str, name: String) -> Result<()> {
        let value = cursor.read_leaf(label)?;
        debug!(target: "rtparams::config", parameter = %name, value = %value, "Leaf read");
        self.out.push(NamedParameter::new(name, value));
        Ok(())
    }
}

impl<'s, C: TreeCursor<'s>> ConfigurationAdapter<'s, C> {
    /// Create an adapter for the node at absolute path `root`
    ///
    /// Nothing is read until [`ParameterSource::resolve`].
    pub fn new(instance_name: impl Into<String>, cursor: C, root: impl Into<String>) -> Self {
        ConfigurationAdapter {
            instance_name: instance_name.into(),
            cursor,
            root: root.into(),
            state: SourceState::Unresolved,
            parameters: Vec::new(),
        }
    }

    /// Absolute path of the adapter's configuration node
    pub fn root(&self) -> &str {
        &self.root
    }

    fn parameters_path(&self) -> String {
        join_field(&self.root, PARAMETERS_NODE)
    }
}

impl<'s, C: TreeCursor<'s>> ParameterSource for ConfigurationAdapter<'s, C> {
    fn instance_name(&self) -> &str {
        &self.instance_name
    }

    fn state(&self) -> SourceState {
        self.state
    }

    fn resolve(&mut self) -> Result<()> {
        self.parameters.clear();
        self.state = SourceState::Unresolved;

        let path = self.parameters_path();
        info!(target: "rtparams::config", instance = %self.instance_name, root = %path, "Resolving configuration parameters");

        let mut collector = Collector { out: Vec::new() };
        match flatten(&mut self.cursor, &path, &mut collector) {
            Ok(count) => {
                self.parameters = collector.out;
                self.state = SourceState::Resolved;
                info!(target: "rtparams::config", instance = %self.instance_name, count, "Configuration parameters resolved");
                Ok(())
            }
            Err(e) => {
                self.state = SourceState::Failed;
                warn!(target: "rtparams::config", instance = %self.instance_name, error = %e, "Configuration resolution failed");
                Err(e)
            }
        }
    }

    fn parameters(&self) -> Result<ParameterSet<'_>> {
        if self.state != SourceState::Resolved {
            return Err(Error::illegal(
                &self.instance_name,
                format!("parameters requested while {}", self.state),
            ));
        }
        let mut set = ParameterSet::with_capacity(self.parameters.len());
        for parameter in &self.parameters {
            set.push_ref(parameter);
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ConfigTree;
    use rtparams_core::{ErrorKind, Ownership};
    use serde_json::json;

    fn store() -> ConfigTree {
        ConfigTree::from_json(&json!({
            "Loader": {
                "Class": "ConfigurationLoader",
                "Parameters": {
                    "gain": 1.5,
                    "coil-limits": [10, 20, 30],
                    "pf": {"label": "PF1", "turns": 12}
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_resolve_borrows_store() {
        let tree = store();
        let mut adapter = ConfigurationAdapter::new("Cfg", tree.cursor(), "Loader");
        assert_eq!(adapter.state(), SourceState::Unresolved);

        adapter.resolve().unwrap();
        assert_eq!(adapter.state(), SourceState::Resolved);

        let params = adapter.parameters().unwrap();
        assert_eq!(params.names(), vec!["gain", "coil.limits", "pf.label", "pf.turns"]);
        for p in params.iter() {
            assert_eq!(p.value.ownership(), Some(Ownership::Borrowed));
        }
        assert_eq!(params.get("pf.label").unwrap().as_text(), Some("PF1"));
        assert_eq!(params.get("coil.limits").unwrap().shape().dims(), &[3]);
    }

    #[test]
    fn test_parameters_before_resolve() {
        let tree = store();
        let adapter = ConfigurationAdapter::new("Cfg", tree.cursor(), "Loader");
        let err = adapter.parameters().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalOperation);
        assert_eq!(err.name(), "Cfg");
    }

    #[test]
    fn test_missing_parameters_node() {
        let tree = store();
        let mut adapter = ConfigurationAdapter::new("Cfg", tree.cursor(), "Nowhere");
        let err = adapter.resolve().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalOperation);
        assert_eq!(err.name(), "Nowhere.Parameters");
        assert_eq!(adapter.state(), SourceState::Failed);
        assert!(adapter.parameters().is_err());
    }

    #[test]
    fn test_reresolve_is_idempotent() {
        let tree = store();
        let mut adapter = ConfigurationAdapter::new("Cfg", tree.cursor(), "Loader");
        adapter.resolve().unwrap();
        let first: Vec<String> = adapter
            .parameters()
            .unwrap()
            .names()
            .into_iter()
            .map(String::from)
            .collect();
        adapter.resolve().unwrap();
        assert_eq!(adapter.parameters().unwrap().names(), first);
    }

    #[test]
    fn test_root_level_parameters() {
        let tree = ConfigTree::from_json(&json!({"Parameters": {"x": 1}})).unwrap();
        let mut adapter = ConfigurationAdapter::new("Top", tree.cursor(), "");
        adapter.resolve().unwrap();
        assert_eq!(adapter.parameters().unwrap().names(), vec!["x"]);
    }
}
