//! Row-major / column-major reorientation of numeric arrays
//!
//! `transpose_and_copy` copies `rows * cols * pages` elements into a new
//! buffer of the same element type, corner-turning on the way:
//!
//! | Case | Mapping |
//! |------|---------|
//! | 2-D (`pages == 1`) | `dst[row + rows*col] = src[col + cols*row]` |
//! | 3-D (`pages > 1`) | `dst[row + rows*col + cols*rows*page] = src[page + pages*col + cols*pages*row]` |
//!
//! In the 3-D case the row and page axes exchange roles and the column axis
//! stays put. This is not a general axis permutation and must not become one.
//!
//! Only the ten numeric element types are accepted.

use rtparams_core::{ElementBuf, ElementType, Elements};
use thiserror::Error;

/// Marshalling errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarshalError {
    /// Element type outside the ten numeric types
    #[error("Unsupported element type: {0}")]
    UnsupportedType(ElementType),

    /// Source or destination shorter than rows * cols * pages
    #[error("Size mismatch: {expected} elements required, {actual} available")]
    SizeMismatch {
        /// Elements the extents require
        expected: usize,
        /// Elements actually present
        actual: usize,
    },

    /// rows * cols * pages does not fit in usize
    #[error("Element count overflow for {rows}x{cols}x{pages}")]
    Overflow {
        /// Row extent
        rows: usize,
        /// Column extent
        cols: usize,
        /// Page extent
        pages: usize,
    },
}

fn element_count(rows: usize, cols: usize, pages: usize) -> Result<usize, MarshalError> {
    rows.checked_mul(cols)
        .and_then(|n| n.checked_mul(pages))
        .ok_or(MarshalError::Overflow { rows, cols, pages })
}

/// Typed corner-turn kernel
///
/// Writes the first `rows * cols * pages` elements of `destination` from
/// `source` using the mapping in the module table.
pub fn corner_turn<T: Copy>(
    destination: &mut [T],
    source: &[T],
    rows: usize,
    cols: usize,
    pages: usize,
) -> Result<(), MarshalError> {
    let count = element_count(rows, cols, pages)?;
    if source.len() < count {
        return Err(MarshalError::SizeMismatch {
            expected: count,
            actual: source.len(),
        });
    }
    if destination.len() < count {
        return Err(MarshalError::SizeMismatch {
            expected: count,
            actual: destination.len(),
        });
    }
    if count == 0 {
        return Ok(());
    }

    if pages == 1 {
        for row in 0..rows {
            for col in 0..cols {
                destination[row + rows * col] = source[col + cols * row];
            }
        }
    } else {
        for page in 0..pages {
            for row in 0..rows {
                for col in 0..cols {
                    destination[row + rows * col + cols * rows * page] =
                        source[page + pages * col + cols * pages * row];
                }
            }
        }
    }
    Ok(())
}

fn turned<T: Copy + Default>(
    source: &[T],
    rows: usize,
    cols: usize,
    pages: usize,
) -> Result<Vec<T>, MarshalError> {
    let mut destination = vec![T::default(); element_count(rows, cols, pages)?];
    corner_turn(&mut destination, source, rows, cols, pages)?;
    Ok(destination)
}

/// Copy `source` into a freshly allocated buffer, corner-turning it
///
/// # Errors
///
/// - `UnsupportedType` for character data
/// - `SizeMismatch` if `source` holds fewer than `rows * cols * pages` elements
/// - `Overflow` if the element count does not fit in usize
pub fn transpose_and_copy(
    source: Elements<'_>,
    rows: usize,
    cols: usize,
    pages: usize,
) -> Result<ElementBuf, MarshalError> {
    let buf = match source {
        Elements::Int8(s) => ElementBuf::Int8(turned(s, rows, cols, pages)?),
        Elements::Int16(s) => ElementBuf::Int16(turned(s, rows, cols, pages)?),
        Elements::Int32(s) => ElementBuf::Int32(turned(s, rows, cols, pages)?),
        Elements::Int64(s) => ElementBuf::Int64(turned(s, rows, cols, pages)?),
        Elements::UInt8(s) => ElementBuf::UInt8(turned(s, rows, cols, pages)?),
        Elements::UInt16(s) => ElementBuf::UInt16(turned(s, rows, cols, pages)?),
        Elements::UInt32(s) => ElementBuf::UInt32(turned(s, rows, cols, pages)?),
        Elements::UInt64(s) => ElementBuf::UInt64(turned(s, rows, cols, pages)?),
        Elements::Float32(s) => ElementBuf::Float32(turned(s, rows, cols, pages)?),
        Elements::Float64(s) => ElementBuf::Float64(turned(s, rows, cols, pages)?),
        Elements::Char(_) => return Err(MarshalError::UnsupportedType(ElementType::Char)),
    };
    Ok(buf)
}

/// Reorient column-major source data into row-major order
///
/// `dims` are the logical extents `[d0, d1]` or `[d0, d1, d2]` of the value.
/// The kernel's `rows` extent indexes the destination's fastest axis, so the
/// extents are passed innermost first: `d0` becomes the kernel's page axis
/// in the 3-D case. Scalars and vectors have no orientation and are copied
/// unchanged.
pub fn column_major_to_row_major(
    source: Elements<'_>,
    dims: &[usize],
) -> Result<ElementBuf, MarshalError> {
    match *dims {
        [d0, d1] => transpose_and_copy(source, d1, d0, 1),
        [d0, d1, d2] => transpose_and_copy(source, d2, d1, d0),
        _ => {
            if !source.element_type().is_numeric() {
                return Err(MarshalError::UnsupportedType(source.element_type()));
            }
            Ok(source.to_buf())
        }
    }
}
