//! Tree database adapter
//!
//! Resolution pass, for a loader node at `root`:
//!
//! 1. read [`ClientSettings`] from the loader node
//! 2. flatten `root.Parameters` into `(name, LeafDeclaration)` pairs; a node
//!    holding a `Path` field (or only leaves) is a declaration, any other node
//!    groups declarations
//! 3. open a client (or use the shared one)
//! 4. for each declaration in flattened order: expand the path, fetch,
//!    decompose the result into named leaves
//!
//! Multi-dimensional numeric leaves declared `ColumnMajor` are reoriented
//! into an owned buffer. Everything else stays in the retained fetch result
//! and is handed out as a view borrowing the adapter.

use crate::client::{ClientSettings, Connection, TreeClient};
use crate::declaration::{LeafDeclaration, PATH_FIELD};
use crate::expand::{expand, Expansion};
use rtparams_config::{flatten, LeafVisitor, PARAMETERS_NODE};
use rtparams_core::{
    join_field, ElementBuf, Error, Leaf, NamedParameter, Orientation, ParameterSet,
    ParameterSource, Payload, Result, Shape, SourceState, TreeCursor, ValueView,
    UNLINKED_ELEMENT_TYPE,
};
use rtparams_marshal::{column_major_to_row_major, decompose, DecomposedLeaf, MarshalError};
use tracing::{debug, info, warn};

/// Result of one leaf, kept for the lifetime of the pass
#[derive(Debug)]
enum Retained {
    /// Fetched data handed out as a view
    Fetched {
        name: String,
        shape: Shape,
        data: ElementBuf,
    },
    /// Reoriented, unlinked or unresolved parameter
    Ready(NamedParameter<'static>),
}

/// Parameter source backed by a remote tree database
pub struct TreeDatabaseAdapter<'c, C> {
    instance_name: String,
    cursor: C,
    root: String,
    connection: Connection<'c>,
    state: SourceState,
    settings: Option<ClientSettings>,
    retained: Vec<Retained>,
}

#[derive(Default)]
struct DeclarationCollector {
    out: Vec<(String, LeafDeclaration)>,
}

fn is_declaration<'s, C: TreeCursor<'s> + ?Sized>(cursor: &C) -> bool {
    cursor.find_child(PATH_FIELD).is_some()
        || (0..cursor.child_count()).all(|i| !cursor.child_is_node(i))
}

impl<'s, C: TreeCursor<'s> + ?Sized> LeafVisitor<C> for DeclarationCollector {
    fn is_terminal(&mut self, cursor: &mut C, index: usize) -> Result<bool> {
        cursor.move_to_child(index)?;
        let terminal = is_declaration(&*cursor);
        cursor.move_to_ancestor(1)?;
        Ok(terminal)
    }

    fn visit(&mut self, cursor: &mut C, index: usize, _label: &str, name: String) -> Result<()> {
        if !cursor.child_is_node(index) {
            return Err(Error::parameters(
                name,
                "expected a declaration node with a Path field",
            ));
        }
        cursor.move_to_child(index)?;
        let declaration = LeafDeclaration::read(&name, &*cursor);
        cursor.move_to_ancestor(1)?;
        self.out.push((name, declaration?));
        Ok(())
    }
}

impl<'c, C> TreeDatabaseAdapter<'c, C> {
    /// Create an adapter for the loader node at absolute path `root`
    pub fn new(
        instance_name: impl Into<String>,
        cursor: C,
        root: impl Into<String>,
        connection: Connection<'c>,
    ) -> Self {
        TreeDatabaseAdapter {
            instance_name: instance_name.into(),
            cursor,
            root: root.into(),
            connection,
            state: SourceState::Unresolved,
            settings: None,
            retained: Vec::new(),
        }
    }

    /// Settings read by the last pass
    pub fn settings(&self) -> Option<&ClientSettings> {
        self.settings.as_ref()
    }
}

impl<'s, 'c, C: TreeCursor<'s>> TreeDatabaseAdapter<'c, C> {
    fn run_pass(&mut self) -> Result<()> {
        self.cursor.move_absolute(&self.root)?;
        let settings = ClientSettings::read(&self.root, &self.cursor)?;

        let mut collector = DeclarationCollector::default();
        flatten(
            &mut self.cursor,
            &join_field(&self.root, PARAMETERS_NODE),
            &mut collector,
        )?;
        info!(
            target: "rtparams::treedb",
            instance = %self.instance_name,
            tree = %settings.tree_name,
            shot = settings.shot,
            declarations = collector.out.len(),
            "Resolving tree database parameters"
        );

        let instance_name = &self.instance_name;
        let mut transient: Box<dyn TreeClient>;
        let client: &mut dyn TreeClient = match &mut self.connection {
            Connection::Direct(connector) => {
                debug!(target: "rtparams::treedb", mode = %settings.access_mode(), server = ?settings.server_address, "Opening tree");
                transient = connector
                    .connect(&settings)
                    .map_err(|e| Error::exception(instance_name, e.message))?;
                transient.as_mut()
            }
            Connection::Shared(client) => &mut **client,
        };

        for (name, declaration) in &collector.out {
            fetch_declaration(client, name, declaration, &mut self.retained)?;
        }

        self.settings = Some(settings);
        Ok(())
    }
}

fn fetch_declaration(
    client: &mut dyn TreeClient,
    name: &str,
    declaration: &LeafDeclaration,
    out: &mut Vec<Retained>,
) -> Result<()> {
    let expression = match expand(name, declaration)? {
        Expansion::Unlinked => {
            warn!(target: "rtparams::treedb", parameter = name, "Unlinked parameter: empty Path");
            out.push(Retained::Ready(NamedParameter::new(
                name,
                ValueView::unlinked(UNLINKED_ELEMENT_TYPE),
            )));
            return Ok(());
        }
        Expansion::Fetch(expression) => expression,
    };

    debug!(target: "rtparams::treedb", parameter = name, expression = %expression, "Fetching");
    let value = client
        .fetch(&expression)
        .map_err(|e| Error::exception(name, e.message))?;

    for leaf in decompose(name, value, declaration.orientation)? {
        out.push(retain(leaf, declaration.orientation)?);
    }
    Ok(())
}

fn marshal_error(name: &str, err: MarshalError) -> Error {
    match err {
        MarshalError::UnsupportedType(ty) => Error::UnsupportedType {
            name: name.to_string(),
            type_name: ty.to_string(),
        },
        other => Error::setup(name, other.to_string()),
    }
}

fn retain(entry: DecomposedLeaf, orientation: Orientation) -> Result<Retained> {
    let linked = entry.is_linked();
    let DecomposedLeaf {
        name,
        leaf: Leaf { dims, payload },
    } = entry;
    let shape = Shape::new(&dims).map_err(|e| Error::from_shape(&name, e))?;

    let data = match payload {
        Payload::Typed(data) => data,
        // nothing to type: unlinked, as decomposition already reported
        Payload::Unknown(_) if !linked => {
            return Ok(Retained::Ready(NamedParameter::new(
                name,
                ValueView::unlinked(UNLINKED_ELEMENT_TYPE),
            )));
        }
        Payload::Unknown(type_name) => {
            warn!(target: "rtparams::treedb", parameter = %name, source_type = %type_name, "Unresolved element type");
            return Ok(Retained::Ready(NamedParameter::new(
                name,
                ValueView::unresolved(shape),
            )));
        }
    };

    if data.is_empty() {
        return Ok(Retained::Ready(NamedParameter::new(
            name,
            ValueView::unlinked(data.element_type()),
        )));
    }
    shape
        .check_len(data.len())
        .map_err(|e| Error::from_shape(&name, e))?;

    if orientation == Orientation::ColumnMajor
        && shape.rank() >= 2
        && data.element_type().is_numeric()
    {
        let turned = column_major_to_row_major(data.as_elements(), shape.dims())
            .map_err(|e| marshal_error(&name, e))?;
        let value = ValueView::owned(turned, shape).map_err(|e| Error::from_shape(&name, e))?;
        debug!(target: "rtparams::treedb", parameter = %name, value = %value, "Reoriented to row-major");
        return Ok(Retained::Ready(NamedParameter::new(name, value)));
    }

    Ok(Retained::Fetched { name, shape, data })
}

impl<'s, 'c, C: TreeCursor<'s>> ParameterSource for TreeDatabaseAdapter<'c, C> {
    fn instance_name(&self) -> &str {
        &self.instance_name
    }

    fn state(&self) -> SourceState {
        self.state
    }

    fn resolve(&mut self) -> Result<()> {
        self.retained.clear();
        self.settings = None;
        self.state = SourceState::Unresolved;

        match self.run_pass() {
            Ok(()) => {
                self.state = SourceState::Resolved;
                info!(target: "rtparams::treedb", instance = %self.instance_name, count = self.retained.len(), "Tree database parameters resolved");
                Ok(())
            }
            Err(e) => {
                self.retained.clear();
                self.state = SourceState::Failed;
                warn!(target: "rtparams::treedb", instance = %self.instance_name, error = %e, "Tree database resolution failed");
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
        let mut set = ParameterSet::with_capacity(self.retained.len());
        for entry in &self.retained {
            match entry {
                Retained::Ready(parameter) => set.push_ref(parameter),
                Retained::Fetched { name, shape, data } => {
                    let value = ValueView::view(data.as_elements(), shape.clone())
                        .map_err(|e| Error::from_shape(name, e))?;
                    set.push(NamedParameter::new(name.clone(), value));
                }
            }
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MemoryConnector, MemoryTreeClient};
    use rtparams_config::ConfigTree;
    use rtparams_core::{CompositeValue, ElementType, ErrorKind, Ownership};
    use serde_json::json;

    fn loader(parameters: serde_json::Value) -> ConfigTree {
        ConfigTree::from_json(&json!({
            "Loader": {
                "TreeName": "tcv",
                "ShotOrVersionNumber": 58000,
                "Parameters": parameters
            }
        }))
        .unwrap()
    }

    fn database() -> MemoryTreeClient {
        MemoryTreeClient::new()
            // 2x3 [[1,2,3],[4,5,6]] stored column-major
            .with("M", Leaf::new(vec![1i32, 4, 2, 5, 3, 6], vec![2, 3]))
            .with("V", Leaf::vector(vec![1.5f64, 2.5]))
            .with("C1", Leaf::scalar(vec![10u16]))
            .with("C2", Leaf::scalar(vec![20u16]))
            .with("C3", Leaf::scalar(vec![30u16]))
            .with("T", Leaf::text("tokamak"))
            .with(
                "R",
                CompositeValue::record([
                    ("a", Leaf::scalar(vec![1i32]).into()),
                    (
                        "b",
                        CompositeValue::record([("c", Leaf::vector(vec![0.5f32; 3]).into())]),
                    ),
                ]),
            )
            .with("X", Leaf::unknown("complex64", vec![2]))
            .with("E", Leaf::unknown("complex64", vec![0]))
    }

    #[test]
    fn test_column_major_matrix_is_reoriented() {
        let tree = loader(json!({"m": {"Path": "M"}}));
        let mut db = database();
        let mut adapter = TreeDatabaseAdapter::new(
            "Tdb",
            tree.cursor(),
            "Loader",
            Connection::Shared(&mut db),
        );
        adapter.resolve().unwrap();

        let params = adapter.parameters().unwrap();
        let m = params.get("m").unwrap();
        assert_eq!(m.ownership(), Some(Ownership::Owned));
        assert_eq!(m.shape().dims(), &[2, 3]);
        assert_eq!(
            m.elements().unwrap().to_buf(),
            ElementBuf::from(vec![1i32, 2, 3, 4, 5, 6])
        );
    }

    #[test]
    fn test_row_major_and_vectors_are_borrowed() {
        let tree = loader(json!({
            "m": {"Path": "M", "DataOrientation": "RowMajor"},
            "v": {"Path": "V"},
            "t": {"Path": "T"}
        }));
        let mut db = database();
        let mut adapter = TreeDatabaseAdapter::new(
            "Tdb",
            tree.cursor(),
            "Loader",
            Connection::Shared(&mut db),
        );
        adapter.resolve().unwrap();

        let params = adapter.parameters().unwrap();
        assert_eq!(params.names(), vec!["m", "v", "t"]);
        for p in params.iter() {
            assert_eq!(p.value.ownership(), Some(Ownership::Borrowed), "{}", p.name);
        }
        assert_eq!(
            params.get("m").unwrap().elements().unwrap().to_buf(),
            ElementBuf::from(vec![1i32, 4, 2, 5, 3, 6])
        );
        assert_eq!(params.get("t").unwrap().as_text(), Some("tokamak"));
    }

    #[test]
    fn test_expansions() {
        let tree = loader(json!({
            "padded": {"Path": "V", "TargetDim": 4},
            "range": {"Path": "C%d", "StartIdx": 1, "StopIdx": 3},
            "spare": {"Path": ""}
        }));
        let mut db = database();
        {
            let mut adapter = TreeDatabaseAdapter::new(
                "Tdb",
                tree.cursor(),
                "Loader",
                Connection::Shared(&mut db),
            );
            adapter.resolve().unwrap();
            let params = adapter.parameters().unwrap();

            let padded = params.get("padded").unwrap();
            assert_eq!(padded.shape().dims(), &[4]);
            assert_eq!(
                padded.elements().unwrap().to_buf(),
                ElementBuf::from(vec![1.5f64, 2.5, 0.0, 0.0])
            );

            let range = params.get("range").unwrap();
            assert_eq!(range.element_type(), Some(ElementType::UInt16));
            assert_eq!(range.shape().dims(), &[3]);

            let spare = params.get("spare").unwrap();
            assert!(!spare.is_linked());
            assert_eq!(spare.byte_size(), 0);
        }
        // the unlinked declaration is never fetched
        assert_eq!(db.fetches().len(), 2);
        assert_eq!(db.fetches()[1].to_string(), "[C1, C2, C3]");
    }

    #[test]
    fn test_records_and_groups() {
        let tree = loader(json!({
            "struct": {"Path": "R"},
            "coils": {"pf-a": {"Path": "V"}}
        }));
        let mut db = database();
        let mut adapter = TreeDatabaseAdapter::new(
            "Tdb",
            tree.cursor(),
            "Loader",
            Connection::Shared(&mut db),
        );
        adapter.resolve().unwrap();
        assert_eq!(
            adapter.parameters().unwrap().names(),
            vec!["struct.a", "struct.b.c", "coils.pf.a"]
        );
    }

    #[test]
    fn test_unknown_type_is_unresolved() {
        let tree = loader(json!({"x": {"Path": "X"}}));
        let mut db = database();
        let mut adapter = TreeDatabaseAdapter::new(
            "Tdb",
            tree.cursor(),
            "Loader",
            Connection::Shared(&mut db),
        );
        adapter.resolve().unwrap();
        let params = adapter.parameters().unwrap();
        assert_eq!(params.get("x").unwrap().element_type(), None);
    }

    #[test]
    fn test_empty_unknown_type_is_unlinked() {
        let tree = loader(json!({"e": {"Path": "E"}}));
        let mut db = database();
        let mut adapter = TreeDatabaseAdapter::new(
            "Tdb",
            tree.cursor(),
            "Loader",
            Connection::Shared(&mut db),
        );
        adapter.resolve().unwrap();
        let params = adapter.parameters().unwrap();
        let e = params.get("e").unwrap();
        assert!(!e.is_linked());
        assert_eq!(e.element_type(), Some(UNLINKED_ELEMENT_TYPE));
    }

    #[test]
    fn test_fetch_error_is_exception() {
        let tree = loader(json!({"ok": {"Path": "V"}, "bad": {"Path": "MISSING"}}));
        let mut db = database();
        let mut adapter = TreeDatabaseAdapter::new(
            "Tdb",
            tree.cursor(),
            "Loader",
            Connection::Shared(&mut db),
        );
        let err = adapter.resolve().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Exception);
        assert_eq!(err.name(), "bad");
        assert!(err.to_string().contains("MISSING"));
        assert_eq!(adapter.state(), SourceState::Failed);
        assert_eq!(
            adapter.parameters().unwrap_err().kind(),
            ErrorKind::IllegalOperation
        );
    }

    #[test]
    fn test_declaration_errors() {
        let cases = vec![
            (json!({"p": {"Path": "P%d", "TargetDim": 2, "StartIdx": 1, "StopIdx": 2}}), "p"),
            (json!({"p": {"DataOrientation": "RowMajor"}}), "p"),
            (json!({"g": {"q": {"Path": "V", "DataOrientation": "Sideways"}}}), "g.q"),
            (json!({"loose": 3}), "loose"),
        ];
        for (parameters, name) in cases {
            let tree = loader(parameters);
            let mut db = database();
            let mut adapter = TreeDatabaseAdapter::new(
                "Tdb",
                tree.cursor(),
                "Loader",
                Connection::Shared(&mut db),
            );
            let err = adapter.resolve().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Parameters);
            assert_eq!(err.name(), name);
        }
    }

    #[test]
    fn test_missing_tree_name() {
        let tree = ConfigTree::from_json(&json!({"Loader": {"Parameters": {}}})).unwrap();
        let mut db = database();
        let mut adapter = TreeDatabaseAdapter::new(
            "Tdb",
            tree.cursor(),
            "Loader",
            Connection::Shared(&mut db),
        );
        let err = adapter.resolve().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parameters);
        assert_eq!(err.name(), "Loader.TreeName");
    }

    #[test]
    fn test_direct_connection_per_pass() {
        let tree = loader(json!({"v": {"Path": "V"}}));
        let connector = MemoryConnector::new("tcv", database());
        let mut adapter = TreeDatabaseAdapter::new(
            "Tdb",
            tree.cursor(),
            "Loader",
            Connection::Direct(Box::new(&connector)),
        );
        adapter.resolve().unwrap();
        adapter.resolve().unwrap();
        assert_eq!(adapter.parameters().unwrap().len(), 1);
        assert_eq!(adapter.settings().unwrap().shot, 58000);
        drop(adapter);

        let sessions = connector.sessions();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].tree_name, "tcv");
    }

    #[test]
    fn test_connect_failure() {
        let tree = loader(json!({"v": {"Path": "V"}}));
        let connector = MemoryConnector::new("jet", database());
        let mut adapter = TreeDatabaseAdapter::new(
            "Tdb",
            tree.cursor(),
            "Loader",
            Connection::Direct(Box::new(&connector)),
        );
        let err = adapter.resolve().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Exception);
        assert_eq!(err.name(), "Tdb");
    }
}
