//! PathValue: the unit of every read, write and delete result.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Path, Reference, Value};

/// A path paired with the value found (or placed) there.
///
/// `value` is `None` when nothing is known at `path`: a missing key in a
/// store, or the placeholder a dispatcher yields when no handler claims a
/// query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathValue {
    pub path: Path,
    pub value: Option<Value>,
}

impl PathValue {
    /// A path-value carrying a value.
    pub fn new(path: Path, value: impl Into<Value>) -> Self {
        Self {
            path,
            value: Some(value.into()),
        }
    }

    /// A path-only placeholder.
    pub fn absent(path: Path) -> Self {
        Self { path, value: None }
    }

    /// True when no value is attached.
    pub fn is_absent(&self) -> bool {
        self.value.is_none()
    }

    /// The reference carried by the value, if any.
    pub fn reference(&self) -> Result<Option<Reference>, Error> {
        match &self.value {
            Some(value) => Reference::from_value_at(value, &self.path),
            None => Ok(None),
        }
    }

    /// Split into path and value.
    pub fn into_parts(self) -> (Path, Option<Value>) {
        (self.path, self.value)
    }
}

impl fmt::Display for PathValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} = {:?}", self.path, value),
            None => write!(f, "{} = <absent>", self.path),
        }
    }
}
