//! Storage orientation of multi-dimensional source data

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order in which a source lays out the elements of a matrix or 3-D array
///
/// Resolved parameters are always row-major; column-major sources are
/// reoriented by the array marshaller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// Last dimension varies fastest
    RowMajor,
    /// First dimension varies fastest
    #[default]
    ColumnMajor,
}

impl Orientation {
    /// Configuration literal
    pub const fn name(&self) -> &'static str {
        match self {
            Orientation::RowMajor => "RowMajor",
            Orientation::ColumnMajor => "ColumnMajor",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RowMajor" => Ok(Orientation::RowMajor),
            "ColumnMajor" => Ok(Orientation::ColumnMajor),
            other => Err(format!(
                "invalid DataOrientation '{}', expected RowMajor or ColumnMajor",
                other
            )),
        }
    }
}
