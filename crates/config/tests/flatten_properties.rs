//! Property tests for tree flattening over generated stores

use proptest::prelude::*;
use rtparams_config::{flatten, normalise_name, ConfigCursor, ConfigTree, LeafVisitor};
use rtparams_core::{ElementBuf, Result, TreeCursor};

struct Collect(Vec<String>);

impl<'s> LeafVisitor<ConfigCursor<'s>> for Collect {
    fn visit(
        &mut self,
        cursor: &mut ConfigCursor<'s>,
        _index: usize,
        label: &str,
        name: String,
    ) -> Result<()> {
        // every visited child must be readable from the parent position
        cursor.read_leaf(label)?;
        self.0.push(name);
        Ok(())
    }
}

fn node_label() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["n0", "n1", "n2", "pf-a", "x-y-z"]).prop_map(String::from)
}

proptest! {
    #[test]
    fn prop_every_leaf_visited_once(
        paths in prop::collection::vec(prop::collection::vec(node_label(), 0..6), 1..40)
    ) {
        let mut tree = ConfigTree::new();
        let mut expected = Vec::new();
        for (i, nodes) in paths.iter().enumerate() {
            let mut labels = nodes.clone();
            labels.push(format!("v{}", i));
            let rel = labels.join(".");
            tree.insert(&format!("Root.{}", rel), ElementBuf::from(vec![i as u32]), &[]).unwrap();
            expected.push(normalise_name(&rel));
        }

        let mut cursor = tree.cursor();
        let mut seen = Collect(Vec::new());
        let count = flatten(&mut cursor, "Root", &mut seen).unwrap();

        prop_assert_eq!(count, paths.len());
        let mut seen = seen.0;
        seen.sort();
        expected.sort();
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn prop_normalise_is_idempotent(name in "[a-z.\\-]{0,24}") {
        let once = normalise_name(&name);
        prop_assert!(!once.contains('-'));
        prop_assert_eq!(normalise_name(&once), once.clone());
    }
}
