//! Path expansion
//!
//! A declared path may carry one expansion directive:
//!
//! | Directive | Expression |
//! |-----------|------------|
//! | none | the path, verbatim |
//! | `TargetDim = N` | the first N elements of the path, zero-padded |
//! | `StartIdx = S`, `StopIdx = E` | the paths obtained by substituting `%d` with S..=E, concatenated |
//!
//! Directives are mutually exclusive. An empty path declares an unlinked
//! parameter and expands to nothing.

use crate::declaration::LeafDeclaration;
use rtparams_core::{Error, Result};
use std::fmt;

/// Index placeholder in range templates
pub const INDEX_PLACEHOLDER: &str = "%d";

/// Access expression sent to the fetch collaborator
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AccessExpression {
    /// The declared path
    Verbatim(String),
    /// Indices `[0, target_dim)` of `path`, zero-padded if it is shorter
    Padded {
        /// Declared path
        path: String,
        /// Requested length
        target_dim: usize,
    },
    /// Ordered concatenation of numbered paths
    Concatenated(Vec<String>),
}

impl fmt::Display for AccessExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessExpression::Verbatim(path) => write!(f, "{}", path),
            AccessExpression::Padded { path, target_dim } => write!(
                f,
                "[DATA({p}), ZERO(MAX(0, {n} - SIZE(DATA({p}))), DATA({p}))][0 : {last}]",
                p = path,
                n = target_dim,
                last = target_dim - 1
            ),
            AccessExpression::Concatenated(paths) => write!(f, "[{}]", paths.join(", ")),
        }
    }
}

/// Outcome of expanding one declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    /// Empty path: nothing to fetch
    Unlinked,
    /// Fetch this expression
    Fetch(AccessExpression),
}

/// Expand the declaration of parameter `name`
///
/// # Errors
///
/// `Parameters` if both directives are given, only one of `StartIdx` /
/// `StopIdx` is given, `StartIdx > StopIdx`, `TargetDim` is 0, or a range
/// template does not contain exactly one `%d`.
pub fn expand(name: &str, declaration: &LeafDeclaration) -> Result<Expansion> {
    let path = declaration.path.as_str();
    if path.is_empty() {
        return Ok(Expansion::Unlinked);
    }

    let has_range = declaration.start_idx.is_some() || declaration.stop_idx.is_some();
    if declaration.target_dim.is_some() && has_range {
        return Err(Error::parameters(
            name,
            "TargetDim and StartIdx/StopIdx are mutually exclusive",
        ));
    }

    if let Some(target_dim) = declaration.target_dim {
        if target_dim == 0 {
            return Err(Error::parameters(name, "TargetDim must be at least 1"));
        }
        return Ok(Expansion::Fetch(AccessExpression::Padded {
            path: path.to_string(),
            target_dim,
        }));
    }

    match (declaration.start_idx, declaration.stop_idx) {
        (None, None) => Ok(Expansion::Fetch(AccessExpression::Verbatim(
            path.to_string(),
        ))),
        (Some(start), Some(stop)) => {
            if start > stop {
                return Err(Error::parameters(
                    name,
                    format!("StartIdx {} is greater than StopIdx {}", start, stop),
                ));
            }
            let placeholders = path.matches(INDEX_PLACEHOLDER).count();
            if placeholders != 1 {
                return Err(Error::parameters(
                    name,
                    format!(
                        "range template '{}' must contain exactly one '{}', found {}",
                        path, INDEX_PLACEHOLDER, placeholders
                    ),
                ));
            }
            let paths = (start..=stop)
                .map(|i| path.replacen(INDEX_PLACEHOLDER, &i.to_string(), 1))
                .collect();
            Ok(Expansion::Fetch(AccessExpression::Concatenated(paths)))
        }
        _ => Err(Error::parameters(
            name,
            "StartIdx and StopIdx must be given together",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtparams_core::ErrorKind;

    fn decl(path: &str) -> LeafDeclaration {
        LeafDeclaration {
            path: path.to_string(),
            ..LeafDeclaration::default()
        }
    }

    #[test]
    fn test_verbatim() {
        let e = expand("p", &decl("\\TOP.COIL:I")).unwrap();
        assert_eq!(
            e,
            Expansion::Fetch(AccessExpression::Verbatim("\\TOP.COIL:I".into()))
        );
    }

    #[test]
    fn test_target_dim() {
        let d = LeafDeclaration {
            target_dim: Some(5),
            ..decl("P")
        };
        let e = expand("p", &d).unwrap();
        let expected = AccessExpression::Padded {
            path: "P".into(),
            target_dim: 5,
        };
        assert_eq!(e, Expansion::Fetch(expected.clone()));
        assert_eq!(
            expected.to_string(),
            "[DATA(P), ZERO(MAX(0, 5 - SIZE(DATA(P))), DATA(P))][0 : 4]"
        );
    }

    #[test]
    fn test_range() {
        let d = LeafDeclaration {
            start_idx: Some(1),
            stop_idx: Some(3),
            ..decl("P%d")
        };
        let e = expand("p", &d).unwrap();
        let expected = AccessExpression::Concatenated(vec!["P1".into(), "P2".into(), "P3".into()]);
        assert_eq!(expected.to_string(), "[P1, P2, P3]");
        assert_eq!(e, Expansion::Fetch(expected));
    }

    #[test]
    fn test_single_index_range() {
        let d = LeafDeclaration {
            start_idx: Some(7),
            stop_idx: Some(7),
            ..decl("COIL_%d:I")
        };
        assert_eq!(
            expand("p", &d).unwrap(),
            Expansion::Fetch(AccessExpression::Concatenated(vec!["COIL_7:I".into()]))
        );
    }

    #[test]
    fn test_empty_path_is_unlinked() {
        assert_eq!(expand("p", &decl("")).unwrap(), Expansion::Unlinked);
    }

    #[test]
    fn test_invalid_directives() {
        let cases = vec![
            LeafDeclaration {
                target_dim: Some(5),
                start_idx: Some(1),
                stop_idx: Some(3),
                ..decl("P%d")
            },
            LeafDeclaration {
                target_dim: Some(0),
                ..decl("P")
            },
            LeafDeclaration {
                start_idx: Some(1),
                ..decl("P%d")
            },
            LeafDeclaration {
                stop_idx: Some(1),
                ..decl("P%d")
            },
            LeafDeclaration {
                start_idx: Some(3),
                stop_idx: Some(1),
                ..decl("P%d")
            },
            LeafDeclaration {
                start_idx: Some(1),
                stop_idx: Some(3),
                ..decl("P")
            },
            LeafDeclaration {
                start_idx: Some(1),
                stop_idx: Some(3),
                ..decl("P%d%d")
            },
        ];
        for d in cases {
            let err = expand("coil", &d).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Parameters, "{:?}", d);
            assert_eq!(err.name(), "coil");
        }
    }
}
