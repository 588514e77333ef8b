//! Shape limits for parameter values
//!
//! Every resolved parameter is a scalar, vector, matrix or 3-D array. Anything
//! deeper is rejected during resolution with `UnsupportedFeature`.

use smallvec::SmallVec;
use std::fmt;
use thiserror::Error;

/// Maximum number of dimensions of a parameter value
pub const MAX_DIMENSIONS: usize = 3;

/// Ordered dimension extents of a value (empty for a scalar)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Shape(SmallVec<[usize; MAX_DIMENSIONS]>);

impl Shape {
    /// Shape of a single scalar element
    pub fn scalar() -> Self {
        Shape(SmallVec::new())
    }

    /// One-dimensional shape with `len` elements
    pub fn vector(len: usize) -> Self {
        Shape(SmallVec::from_slice(&[len]))
    }

    /// Build a shape, rejecting more than [`MAX_DIMENSIONS`] extents
    pub fn new(dims: &[usize]) -> Result<Self, ShapeError> {
        if dims.len() > MAX_DIMENSIONS {
            return Err(ShapeError::TooManyDimensions {
                actual: dims.len(),
                max: MAX_DIMENSIONS,
            });
        }
        Ok(Shape(SmallVec::from_slice(dims)))
    }

    /// Dimension extents
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Number of dimensions (0 for a scalar)
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements, checked for overflow
    pub fn element_count(&self) -> Result<usize, ShapeError> {
        self.0
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or(ShapeError::Overflow)
    }

    /// Check that a buffer of `len` elements fills this shape exactly
    pub fn check_len(&self, len: usize) -> Result<(), ShapeError> {
        let expected = self.element_count()?;
        if expected != len {
            return Err(ShapeError::LengthMismatch {
                expected,
                actual: len,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "x")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

/// Shape validation errors
///
/// Adapters map these onto [`crate::Error`] together with the parameter name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// More dimensions than [`MAX_DIMENSIONS`]
    #[error("Too many dimensions: {actual} exceeds maximum {max}")]
    TooManyDimensions {
        /// Actual number of dimensions
        actual: usize,
        /// Maximum allowed
        max: usize,
    },

    /// Element count does not fit in usize
    #[error("Element count overflow")]
    Overflow,

    /// Buffer length does not match the shape
    #[error("Length mismatch: shape holds {expected} elements, buffer has {actual}")]
    LengthMismatch {
        /// Elements required by the shape
        expected: usize,
        /// Elements present in the buffer
        actual: usize,
    },
}
