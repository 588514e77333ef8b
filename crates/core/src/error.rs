//! Error types for parameter resolution
//!
//! Every error is raised at the offending leaf or node and carries that
//! parameter's (or node's) name, so the only diagnostic a caller needs is the
//! kind, the name and, for fetch failures, the collaborator's message.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::limits::ShapeError;
use thiserror::Error;

/// Result type alias for resolution operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for parameter resolution
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Missing or invalid declarative field
    #[error("Parameters error in '{name}': {reason}")]
    Parameters {
        /// Offending parameter or node
        name: String,
        /// What was wrong with the declaration
        reason: String,
    },

    /// Navigation to a non-existent node, or an operation invalid in the current state
    #[error("Illegal operation on '{name}': {reason}")]
    IllegalOperation {
        /// Offending parameter or node
        name: String,
        /// What was attempted
        reason: String,
    },

    /// Value shape or composition outside what resolution supports
    #[error("Unsupported feature in '{name}': {reason}")]
    UnsupportedFeature {
        /// Offending parameter
        name: String,
        /// What was unsupported
        reason: String,
    },

    /// Element type the array marshaller cannot handle
    #[error("Unsupported type in '{name}': {type_name}")]
    UnsupportedType {
        /// Offending parameter
        name: String,
        /// Type that was rejected
        type_name: String,
    },

    /// Remote fetch collaborator raised a transport or protocol error
    #[error("Exception while resolving '{name}': {message}")]
    Exception {
        /// Offending parameter (or loader instance, for connection errors)
        name: String,
        /// Collaborator message, passed through unchanged
        message: String,
    },

    /// Post-fetch value construction failed
    #[error("Internal setup error in '{name}': {reason}")]
    InternalSetup {
        /// Offending parameter
        name: String,
        /// What failed
        reason: String,
    },

    /// A resolved parameter has no element type
    #[error("Unresolved element type for '{name}'")]
    UnresolvedType {
        /// Offending parameter, qualified with its loader instance
        name: String,
    },
}

/// Stable discriminant of [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`Error::Parameters`]
    Parameters,
    /// See [`Error::IllegalOperation`]
    IllegalOperation,
    /// See [`Error::UnsupportedFeature`]
    UnsupportedFeature,
    /// See [`Error::UnsupportedType`]
    UnsupportedType,
    /// See [`Error::Exception`]
    Exception,
    /// See [`Error::InternalSetup`]
    InternalSetup,
    /// See [`Error::UnresolvedType`]
    UnresolvedType,
}

impl Error {
    /// Missing or invalid declarative field
    pub fn parameters(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Parameters {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Illegal navigation or state transition
    pub fn illegal(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::IllegalOperation {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Unsupported shape or composition
    pub fn unsupported(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::UnsupportedFeature {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Collaborator failure
    pub fn exception(name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Exception {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Value construction failure
    pub fn setup(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InternalSetup {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Map a shape violation onto the error taxonomy
    ///
    /// Too many dimensions is an unsupported feature; overflow and length
    /// mismatches happen while constructing the value.
    pub fn from_shape(name: impl Into<String>, err: ShapeError) -> Self {
        match err {
            ShapeError::TooManyDimensions { .. } => Error::unsupported(name, err.to_string()),
            ShapeError::Overflow | ShapeError::LengthMismatch { .. } => {
                Error::setup(name, err.to_string())
            }
        }
    }

    /// Kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Parameters { .. } => ErrorKind::Parameters,
            Error::IllegalOperation { .. } => ErrorKind::IllegalOperation,
            Error::UnsupportedFeature { .. } => ErrorKind::UnsupportedFeature,
            Error::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            Error::Exception { .. } => ErrorKind::Exception,
            Error::InternalSetup { .. } => ErrorKind::InternalSetup,
            Error::UnresolvedType { .. } => ErrorKind::UnresolvedType,
        }
    }

    /// Name of the offending parameter or node
    pub fn name(&self) -> &str {
        match self {
            Error::Parameters { name, .. }
            | Error::IllegalOperation { name, .. }
            | Error::UnsupportedFeature { name, .. }
            | Error::UnsupportedType { name, .. }
            | Error::Exception { name, .. }
            | Error::InternalSetup { name, .. }
            | Error::UnresolvedType { name } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_parameters() {
        let err = Error::parameters("Gain", "both TargetDim and StartIdx given");
        let msg = err.to_string();
        assert!(msg.contains("Parameters error"));
        assert!(msg.contains("Gain"));
        assert!(msg.contains("both TargetDim"));
    }

    #[test]
    fn test_error_display_exception() {
        let err = Error::exception("Coils.Current", "connection refused");
        let msg = err.to_string();
        assert!(msg.contains("Exception"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_error_kind_and_name() {
        let cases = vec![
            (Error::parameters("a", "r"), ErrorKind::Parameters),
            (Error::illegal("b", "r"), ErrorKind::IllegalOperation),
            (Error::unsupported("c", "r"), ErrorKind::UnsupportedFeature),
            (
                Error::UnsupportedType {
                    name: "d".to_string(),
                    type_name: "char".to_string(),
                },
                ErrorKind::UnsupportedType,
            ),
            (Error::exception("e", "m"), ErrorKind::Exception),
            (Error::setup("f", "r"), ErrorKind::InternalSetup),
            (
                Error::UnresolvedType {
                    name: "g".to_string(),
                },
                ErrorKind::UnresolvedType,
            ),
        ];

        for (err, kind) in cases {
            assert_eq!(err.kind(), kind);
            assert_eq!(err.name().len(), 1);
        }
    }

    #[test]
    fn test_from_shape_mapping() {
        let deep = ShapeError::TooManyDimensions { actual: 4, max: 3 };
        assert_eq!(
            Error::from_shape("x", deep).kind(),
            ErrorKind::UnsupportedFeature
        );

        let short = ShapeError::LengthMismatch {
            expected: 6,
            actual: 4,
        };
        let err = Error::from_shape("x", short);
        assert_eq!(err.kind(), ErrorKind::InternalSetup);
        assert_eq!(err.name(), "x");
        assert_eq!(
            Error::from_shape("y", ShapeError::Overflow).kind(),
            ErrorKind::InternalSetup
        );
    }
}
