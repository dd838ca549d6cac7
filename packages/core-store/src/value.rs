//! The Value type - a tree-shaped data structure.
//!
//! Values are what paths address. Stores navigate them segment by segment;
//! handlers synthesize them.

use std::collections::BTreeMap;

use crate::{Error, Path, Segment};

/// A tree-shaped value that can be read from or written to a store.
///
/// # Design Notes
///
/// - Uses `BTreeMap` for deterministic ordering (wildcard reads enumerate
///   map keys in this order)
/// - Includes `Bytes` for binary data
/// - Uses `i64` for integers
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Absence of a value. Distinct from "path doesn't exist".
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed 64-bit integer.
    Integer(i64),
    /// 64-bit floating point.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// Ordered sequence of values.
    Array(Vec<Value>),
    /// Key-value map with string keys.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Create a null value.
    pub fn null() -> Self {
        Value::Null
    }

    /// Create an empty map.
    pub fn map() -> Self {
        Value::Map(BTreeMap::new())
    }

    /// Create an empty array.
    pub fn array() -> Self {
        Value::Array(Vec::new())
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is a map.
    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Check if this value is an array.
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Borrow the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get a direct child by a concrete segment.
    ///
    /// Keys address maps, indices address arrays. A map key that happens to
    /// be numeric is reachable through an index segment too.
    pub fn child(&self, segment: &Segment) -> Option<&Value> {
        match (self, segment) {
            (Value::Map(map), Segment::Key(k)) => map.get(k),
            (Value::Map(map), Segment::Index(i)) => map.get(&i.to_string()),
            (Value::Array(arr), Segment::Index(i)) => arr.get(*i),
            _ => None,
        }
    }

    fn child_mut(&mut self, segment: &Segment) -> Option<&mut Value> {
        match (self, segment) {
            (Value::Map(map), Segment::Key(k)) => map.get_mut(k),
            (Value::Map(map), Segment::Index(i)) => map.get_mut(&i.to_string()),
            (Value::Array(arr), Segment::Index(i)) => arr.get_mut(*i),
            _ => None,
        }
    }

    /// Get a reference to a nested value by path.
    ///
    /// Returns `None` if the path doesn't exist, can't be navigated, or is
    /// not concrete.
    pub fn get(&self, path: &Path) -> Option<&Value> {
        path.iter().try_fold(self, |current, segment| current.child(segment))
    }

    /// Get a mutable reference to a nested value by path.
    pub fn get_mut(&mut self, path: &Path) -> Option<&mut Value> {
        let mut current = self;
        for segment in path.iter() {
            current = current.child_mut(segment)?;
        }
        Some(current)
    }

    /// Set a value at a concrete path, creating intermediate maps as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not concrete, traverses through a
    /// non-container value, or indexes past the end of an array (appending
    /// at exactly `len` is allowed).
    pub fn set(&mut self, path: &Path, value: Value) -> Result<(), Error> {
        let Some((last, parents)) = path.segments.split_last() else {
            *self = value;
            return Ok(());
        };

        let mut current = self;
        for segment in parents {
            if current.is_null() {
                *current = Value::map();
            }
            current = current.entry(segment)?;
        }

        if current.is_null() {
            *current = Value::map();
        }
        match (current, last) {
            (Value::Map(map), Segment::Key(k)) => {
                map.insert(k.clone(), value);
                Ok(())
            }
            (Value::Map(map), Segment::Index(i)) => {
                map.insert(i.to_string(), value);
                Ok(())
            }
            (Value::Array(arr), Segment::Index(i)) => {
                if *i < arr.len() {
                    arr[*i] = value;
                } else if *i == arr.len() {
                    arr.push(value);
                } else {
                    return Err(Error::InvalidPath {
                        message: format!("array index {} out of bounds", i),
                    });
                }
                Ok(())
            }
            (_, segment) => Err(Error::InvalidPath {
                message: format!("cannot set child '{}' on non-container value", segment),
            }),
        }
    }

    /// Navigate one level for writing, creating a map child when missing.
    fn entry(&mut self, segment: &Segment) -> Result<&mut Value, Error> {
        match (self, segment) {
            (Value::Map(map), Segment::Key(k)) => Ok(map.entry(k.clone()).or_insert_with(Value::map)),
            (Value::Map(map), Segment::Index(i)) => {
                Ok(map.entry(i.to_string()).or_insert_with(Value::map))
            }
            (Value::Array(arr), Segment::Index(i)) => {
                let len = arr.len();
                arr.get_mut(*i).ok_or_else(|| Error::InvalidPath {
                    message: format!("array index {} out of bounds (len {})", i, len),
                })
            }
            (_, segment) => Err(Error::InvalidPath {
                message: format!("cannot navigate through non-container at '{}'", segment),
            }),
        }
    }

    /// Remove a value at a concrete path, returning it if it existed.
    pub fn remove(&mut self, path: &Path) -> Result<Option<Value>, Error> {
        let Some((last, parents)) = path.segments.split_last() else {
            let old = std::mem::replace(self, Value::Null);
            return Ok(Some(old));
        };

        let parent = match self.get_mut(&Path::new(parents.to_vec())) {
            Some(p) => p,
            None => return Ok(None),
        };

        match (parent, last) {
            (Value::Map(map), Segment::Key(k)) => Ok(map.remove(k)),
            (Value::Map(map), Segment::Index(i)) => Ok(map.remove(&i.to_string())),
            (Value::Array(arr), Segment::Index(i)) => {
                if *i < arr.len() {
                    Ok(Some(arr.remove(*i)))
                } else {
                    Ok(None)
                }
            }
            (_, segment) if !segment.is_concrete() => Err(Error::InvalidPath {
                message: format!("cannot remove through query segment '{}'", segment),
            }),
            _ => Ok(None),
        }
    }
}

// Conversion from common types

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Map(v)
    }
}
