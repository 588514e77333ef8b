//! Declarative settings read from the configuration tree
//!
//! A tree database loader node looks like:
//!
//! ```text
//! Loader = {
//!     TreeName = "tcv_shot"
//!     ShotOrVersionNumber = 58000      (optional, default -1)
//!     ServerAddress = "host:8000"      (optional)
//!     Parameters = {
//!         coil-currents = {
//!             Path = "\MAGNETICS::COILS:I_%d"
//!             StartIdx = 1
//!             StopIdx = 16
//!         }
//!         gains = {
//!             Path = "\CONTROL::GAINS"
//!             DataOrientation = "RowMajor"
//!         }
//!     }
//! }
//! ```

use crate::client::ClientSettings;
use rtparams_core::{join_field, Error, Orientation, Result, TreeCursor, ValueView};
use serde::{Deserialize, Serialize};

/// Field holding the node path of a declaration
pub const PATH_FIELD: &str = "Path";
/// Field holding the source orientation
pub const ORIENTATION_FIELD: &str = "DataOrientation";
/// Field holding the padded length
pub const TARGET_DIM_FIELD: &str = "TargetDim";
/// Field holding the first range index
pub const START_IDX_FIELD: &str = "StartIdx";
/// Field holding the last range index
pub const STOP_IDX_FIELD: &str = "StopIdx";

/// Field holding the tree name of a loader
pub const TREE_NAME_FIELD: &str = "TreeName";
/// Field holding the shot or version number of a loader
pub const SHOT_FIELD: &str = "ShotOrVersionNumber";
/// Field holding the optional server address of a loader
pub const SERVER_FIELD: &str = "ServerAddress";

/// One parameter declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LeafDeclaration {
    /// Node path (or range template); empty declares an unlinked parameter
    pub path: String,
    /// Layout of the source data
    #[serde(rename = "DataOrientation", default)]
    pub orientation: Orientation,
    /// Requested padded length
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_dim: Option<usize>,
    /// First index substituted into the template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_idx: Option<usize>,
    /// Last index substituted into the template, inclusive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_idx: Option<usize>,
}

impl LeafDeclaration {
    /// Read the declaration of parameter `name` from the node the cursor is on
    ///
    /// # Errors
    ///
    /// `Parameters` if `Path` is missing or not a string, `DataOrientation`
    /// is not `RowMajor`/`ColumnMajor`, or an index field is not a
    /// non-negative integer.
    pub fn read<'s, C: TreeCursor<'s> + ?Sized>(name: &str, cursor: &C) -> Result<Self> {
        let path = match optional_leaf(cursor, PATH_FIELD)? {
            Some(value) => text_field(name, PATH_FIELD, &value)?,
            None => return Err(Error::parameters(name, "missing Path")),
        };

        let orientation = match optional_leaf(cursor, ORIENTATION_FIELD)? {
            Some(value) => text_field(name, ORIENTATION_FIELD, &value)?
                .parse::<Orientation>()
                .map_err(|reason: String| Error::parameters(name, reason))?,
            None => Orientation::default(),
        };

        Ok(LeafDeclaration {
            path,
            orientation,
            target_dim: index_field(name, cursor, TARGET_DIM_FIELD)?,
            start_idx: index_field(name, cursor, START_IDX_FIELD)?,
            stop_idx: index_field(name, cursor, STOP_IDX_FIELD)?,
        })
    }
}

impl ClientSettings {
    /// Read loader settings from the node the cursor is on
    ///
    /// `node` is the loader's path, used to name errors.
    ///
    /// # Errors
    ///
    /// `Parameters` if `TreeName` is missing or any field has the wrong type.
    pub fn read<'s, C: TreeCursor<'s> + ?Sized>(node: &str, cursor: &C) -> Result<Self> {
        let field_name = |field: &str| join_field(node, field);

        let tree_name = match optional_leaf(cursor, TREE_NAME_FIELD)? {
            Some(value) => text_field(&field_name(TREE_NAME_FIELD), TREE_NAME_FIELD, &value)?,
            None => return Err(Error::parameters(field_name(TREE_NAME_FIELD), "missing TreeName")),
        };
        if tree_name.is_empty() {
            return Err(Error::parameters(field_name(TREE_NAME_FIELD), "TreeName is empty"));
        }

        let shot = match optional_leaf(cursor, SHOT_FIELD)? {
            Some(value) => value.as_i64().ok_or_else(|| {
                Error::parameters(field_name(SHOT_FIELD), "ShotOrVersionNumber must be an integer")
            })?,
            None => ClientSettings::DEFAULT_SHOT,
        };

        let server_address = match optional_leaf(cursor, SERVER_FIELD)? {
            Some(value) => {
                let address = text_field(&field_name(SERVER_FIELD), SERVER_FIELD, &value)?;
                Some(address).filter(|a| !a.is_empty())
            }
            None => None,
        };

        Ok(ClientSettings {
            tree_name,
            shot,
            server_address,
        })
    }
}

/// Read leaf `field` if the current node has one
fn optional_leaf<'s, C: TreeCursor<'s> + ?Sized>(
    cursor: &C,
    field: &str,
) -> Result<Option<ValueView<'s>>> {
    match cursor.find_child(field) {
        Some(_) => cursor.read_leaf(field).map(Some),
        None => Ok(None),
    }
}

fn text_field(name: &str, field: &str, value: &ValueView<'_>) -> Result<String> {
    value
        .as_text()
        .map(str::to_string)
        .ok_or_else(|| {
            Error::parameters(name, format!("{} must be a string, found {}", field, value))
        })
}

fn index_field<'s, C: TreeCursor<'s> + ?Sized>(
    name: &str,
    cursor: &C,
    field: &str,
) -> Result<Option<usize>> {
    let value = match optional_leaf(cursor, field)? {
        Some(value) => value,
        None => return Ok(None),
    };
    let raw = value
        .as_i64()
        .ok_or_else(|| Error::parameters(name, format!("{} must be an integer", field)))?;
    usize::try_from(raw)
        .map(Some)
        .map_err(|_| {
            Error::parameters(name, format!("{} must not be negative, found {}", field, raw))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtparams_config::ConfigTree;
    use rtparams_core::ErrorKind;
    use serde_json::json;

    fn read_at(doc: serde_json::Value, path: &str) -> Result<LeafDeclaration> {
        let tree = ConfigTree::from_json(&doc).unwrap();
        let mut cursor = tree.cursor();
        cursor.move_absolute(path).unwrap();
        LeafDeclaration::read("p", &cursor)
    }

    #[test]
    fn test_defaults() {
        let d = read_at(json!({"P": {"Path": "\\A::B"}}), "P").unwrap();
        assert_eq!(d.path, "\\A::B");
        assert_eq!(d.orientation, Orientation::ColumnMajor);
        assert_eq!(d.target_dim, None);
    }

    #[test]
    fn test_all_fields() {
        let d = read_at(
            json!({"P": {"Path": "X%d", "DataOrientation": "RowMajor", "StartIdx": 2, "StopIdx": 4}}),
            "P",
        )
        .unwrap();
        assert_eq!(d.orientation, Orientation::RowMajor);
        assert_eq!(d.start_idx, Some(2));
        assert_eq!(d.stop_idx, Some(4));
    }

    #[test]
    fn test_invalid_fields() {
        let cases = vec![
            json!({"P": {"TargetDim": 3}}),
            json!({"P": {"Path": 12}}),
            json!({"P": {"Path": "A", "DataOrientation": "Diagonal"}}),
            json!({"P": {"Path": "A", "TargetDim": -1}}),
            json!({"P": {"Path": "A", "TargetDim": 2.5}}),
        ];
        for doc in cases {
            let err = read_at(doc.clone(), "P").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Parameters, "{}", doc);
        }
    }

    #[test]
    fn test_serde_field_names() {
        let d: LeafDeclaration = serde_json::from_value(json!({
            "Path": "A",
            "DataOrientation": "RowMajor",
            "TargetDim": 4
        }))
        .unwrap();
        assert_eq!(d.orientation, Orientation::RowMajor);
        assert_eq!(d.target_dim, Some(4));
        let back = serde_json::to_value(&d).unwrap();
        assert_eq!(back["TargetDim"], json!(4));
        assert!(back.get("StartIdx").is_none());
    }

    #[test]
    fn test_client_settings() {
        let tree = ConfigTree::from_json(&json!({
            "L": {"TreeName": "tcv", "ShotOrVersionNumber": 58000, "ServerAddress": "srv:8000"},
            "M": {"TreeName": "tcv"},
            "N": {"ShotOrVersionNumber": 1}
        }))
        .unwrap();
        let mut cursor = tree.cursor();

        cursor.move_absolute("L").unwrap();
        let s = ClientSettings::read("L", &cursor).unwrap();
        assert_eq!(s.tree_name, "tcv");
        assert_eq!(s.shot, 58000);
        assert_eq!(s.server_address.as_deref(), Some("srv:8000"));

        cursor.move_absolute("M").unwrap();
        let s = ClientSettings::read("M", &cursor).unwrap();
        assert_eq!(s.shot, -1);
        assert!(s.server_address.is_none());

        cursor.move_absolute("N").unwrap();
        let err = ClientSettings::read("N", &cursor).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parameters);
        assert_eq!(err.name(), "N.TreeName");
    }
}
