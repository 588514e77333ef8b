//! Aggregation of parameter sources
//!
//! The aggregator owns an ordered list of adapters and drives one
//! resolution pass over all of them:
//!
//! 1. resolve each adapter in insertion order, stopping at the first failure
//! 2. check that every parameter has an element type
//!
//! After a successful pass the merged parameters can be enumerated or
//! published to a [`Registry`] as `<instance>.<parameter>`.

use rtparams_core::{
    join_field, Error, ParameterSet, ParameterSource, Registry, Result, SourceState,
};
use tracing::{debug, info, warn};

/// Name used for errors raised by the aggregator itself
pub const AGGREGATOR_NAME: &str = "ParameterAggregator";

/// Ordered collection of parameter sources resolved as one unit
pub struct ParameterAggregator<'a> {
    sources: Vec<Box<dyn ParameterSource + 'a>>,
    state: SourceState,
}

impl<'a> Default for ParameterAggregator<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ParameterAggregator<'a> {
    /// Create an empty aggregator
    pub fn new() -> Self {
        ParameterAggregator {
            sources: Vec::new(),
            state: SourceState::Unresolved,
        }
    }

    /// Append a source; any earlier pass is invalidated
    pub fn add(&mut self, source: impl ParameterSource + 'a) {
        self.add_boxed(Box::new(source));
    }

    /// Append a boxed source; any earlier pass is invalidated
    pub fn add_boxed(&mut self, source: Box<dyn ParameterSource + 'a>) {
        self.sources.push(source);
        self.state = SourceState::Unresolved;
    }

    /// Builder form of [`ParameterAggregator::add`]
    pub fn with(mut self, source: impl ParameterSource + 'a) -> Self {
        self.add(source);
        self
    }

    /// Number of sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if there are no sources
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// State of the last pass
    pub fn state(&self) -> SourceState {
        self.state
    }

    /// State of each source, by instance name
    pub fn source_states(&self) -> Vec<(&str, SourceState)> {
        self.sources
            .iter()
            .map(|s| (s.instance_name(), s.state()))
            .collect()
    }

    /// Resolve every source in order
    ///
    /// # Errors
    ///
    /// The first source error, unchanged; `UnresolvedType` (with the
    /// qualified parameter name) if any parameter has no element type.
    pub fn resolve(&mut self) -> Result<()> {
        self.state = SourceState::Unresolved;
        info!(target: "rtparams::engine", sources = self.sources.len(), "Resolving parameter sources");

        match self.run_pass() {
            Ok(count) => {
                self.state = SourceState::Resolved;
                info!(target: "rtparams::engine", parameters = count, "Parameter sources resolved");
                Ok(())
            }
            Err(e) => {
                self.state = SourceState::Failed;
                warn!(target: "rtparams::engine", error = %e, "Parameter resolution failed");
                Err(e)
            }
        }
    }

    fn run_pass(&mut self) -> Result<usize> {
        for source in self.sources.iter_mut() {
            debug!(target: "rtparams::engine", instance = source.instance_name(), "Resolving source");
            source.resolve()?;
        }

        let mut count = 0;
        for source in &self.sources {
            let set = source.parameters()?;
            for parameter in set.iter() {
                if parameter.value.element_type().is_none() {
                    return Err(Error::UnresolvedType {
                        name: join_field(source.instance_name(), &parameter.name),
                    });
                }
            }
            count += set.len();
        }
        Ok(count)
    }

    /// Parameters of the last pass, grouped by source instance name
    ///
    /// # Errors
    ///
    /// `IllegalOperation` unless the last pass succeeded.
    pub fn parameters(&self) -> Result<Vec<(&str, ParameterSet<'_>)>> {
        self.check_resolved()?;
        self.sources
            .iter()
            .map(|s| s.parameters().map(|set| (s.instance_name(), set)))
            .collect()
    }

    /// Insert every parameter into `registry` as `<instance>.<parameter>`
    ///
    /// Returns the number of inserted parameters.
    ///
    /// # Errors
    ///
    /// `IllegalOperation` unless the last pass succeeded; registry errors
    /// stop publication at the failing parameter.
    pub fn publish(&self, registry: &mut dyn Registry) -> Result<usize> {
        let mut count = 0;
        for (instance, set) in self.parameters()? {
            for parameter in set.iter() {
                registry.insert(join_field(instance, &parameter.name), &parameter.value)?;
                count += 1;
            }
        }
        info!(target: "rtparams::engine", parameters = count, "Parameters published");
        Ok(count)
    }

    fn check_resolved(&self) -> Result<()> {
        if self.state != SourceState::Resolved {
            return Err(Error::illegal(
                AGGREGATOR_NAME,
                format!("parameters requested while {}", self.state),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MemoryRegistry;
    use rtparams_core::{ErrorKind, NamedParameter, Shape, ValueView, UNLINKED_ELEMENT_TYPE};

    /// Source producing fixed unlinked or unresolved parameters
    struct Fixed {
        instance: &'static str,
        names: Vec<&'static str>,
        unresolved: Option<&'static str>,
        fail: bool,
        state: SourceState,
        parameters: Vec<NamedParameter<'static>>,
    }

    impl Fixed {
        fn new(instance: &'static str, names: &[&'static str]) -> Self {
            Fixed {
                instance,
                names: names.to_vec(),
                unresolved: None,
                fail: false,
                state: SourceState::Unresolved,
                parameters: Vec::new(),
            }
        }
    }

    impl ParameterSource for Fixed {
        fn instance_name(&self) -> &str {
            self.instance
        }

        fn state(&self) -> SourceState {
            self.state
        }

        fn resolve(&mut self) -> Result<()> {
            if self.fail {
                self.state = SourceState::Failed;
                return Err(Error::exception(self.instance, "connection refused"));
            }
            self.parameters = self
                .names
                .iter()
                .map(|&n| {
                    let value = if Some(n) == self.unresolved {
                        ValueView::unresolved(Shape::scalar())
                    } else {
                        ValueView::unlinked(UNLINKED_ELEMENT_TYPE)
                    };
                    NamedParameter::new(n, value)
                })
                .collect();
            self.state = SourceState::Resolved;
            Ok(())
        }

        fn parameters(&self) -> Result<ParameterSet<'_>> {
            let mut set = ParameterSet::new();
            for p in &self.parameters {
                set.push_ref(p);
            }
            Ok(set)
        }
    }

    #[test]
    fn test_union_of_disjoint_sources() {
        let mut aggregator = ParameterAggregator::new()
            .with(Fixed::new("A", &["x", "y"]))
            .with(Fixed::new("B", &["z"]));
        aggregator.resolve().unwrap();

        let params = aggregator.parameters().unwrap();
        let qualified: Vec<String> = params
            .iter()
            .flat_map(|(instance, set)| {
                set.names()
                    .into_iter()
                    .map(move |n| format!("{}.{}", instance, n))
            })
            .collect();
        assert_eq!(qualified, vec!["A.x", "A.y", "B.z"]);
    }

    #[test]
    fn test_unresolved_type_aborts() {
        let mut bad = Fixed::new("B", &["z", "w"]);
        bad.unresolved = Some("w");
        let mut aggregator = ParameterAggregator::new()
            .with(Fixed::new("A", &["x"]))
            .with(bad);

        let err = aggregator.resolve().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnresolvedType);
        assert_eq!(err.name(), "B.w");
        assert_eq!(aggregator.state(), SourceState::Failed);
        assert!(aggregator.parameters().is_err());
    }

    #[test]
    fn test_fail_fast() {
        let mut failing = Fixed::new("A", &["x"]);
        failing.fail = true;
        let mut aggregator = ParameterAggregator::new()
            .with(failing)
            .with(Fixed::new("B", &["z"]));

        let err = aggregator.resolve().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Exception);
        assert_eq!(
            aggregator.source_states(),
            vec![("A", SourceState::Failed), ("B", SourceState::Unresolved)]
        );
    }

    #[test]
    fn test_publish() {
        let mut aggregator = ParameterAggregator::new()
            .with(Fixed::new("A", &["x"]))
            .with(Fixed::new("B", &["x"]));

        let mut registry = MemoryRegistry::new();
        let err = aggregator.publish(&mut registry).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalOperation);

        aggregator.resolve().unwrap();
        assert_eq!(aggregator.publish(&mut registry).unwrap(), 2);
        assert_eq!(registry.names(), vec!["A.x", "B.x"]);

        // publishing twice collides in the registry
        let err = aggregator.publish(&mut registry).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalOperation);
        assert_eq!(err.name(), "A.x");
    }

    #[test]
    fn test_empty_aggregator() {
        let mut aggregator = ParameterAggregator::new();
        assert!(aggregator.is_empty());
        aggregator.resolve().unwrap();
        assert!(aggregator.parameters().unwrap().is_empty());
    }
}
