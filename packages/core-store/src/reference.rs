//! The Reference pattern - a value that says "my content lives elsewhere".
//!
//! A reference is a map carrying the reserved [`REF_KEY`] whose payload is
//! a path. Readers that understand references follow them; everything else
//! sees an ordinary map.
//!
//! ```json
//! {"$ref": "users/alice"}
//! {"$ref": ["users", "alice", 0]}
//! ```
//!
//! In the array form strings are literal keys and integers are indices, so
//! it can name keys the path syntax rejects.

use collection_literals::btree;

use crate::{Error, Path, Segment, Value};

/// Reserved field name marking a reference value.
pub const REF_KEY: &str = "$ref";

/// A reference to the value at another path.
///
/// # Examples
///
/// ```
/// use patternfs_core_store::{path, Reference};
///
/// let value = Reference::new(path!("users/alice")).to_value();
/// assert!(Reference::is_reference(&value));
///
/// let parsed = Reference::from_value(&value).unwrap().unwrap();
/// assert_eq!(parsed.target, path!("users/alice"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// The path the reference points at.
    pub target: Path,
}

impl Reference {
    /// Create a reference to `target`.
    pub fn new(target: Path) -> Self {
        Self { target }
    }

    /// Convert to the canonical value form.
    ///
    /// The payload is the path string, `{"$ref": "<path>"}`, unless the
    /// target has keys the path syntax can't express; those targets are
    /// written as a segment array instead.
    pub fn to_value(&self) -> Value {
        let payload = if self.target.has_text_form() {
            Value::String(self.target.to_string())
        } else {
            Value::Array(
                self.target
                    .iter()
                    .map(|segment| match segment {
                        Segment::Key(k) => Value::String(k.clone()),
                        Segment::Index(i) => i64::try_from(*i)
                            .map(Value::Integer)
                            .unwrap_or_else(|_| Value::String(i.to_string())),
                        other => Value::String(other.to_string()),
                    })
                    .collect(),
            )
        };
        Value::Map(btree! {
            REF_KEY.to_string() => payload,
        })
    }

    /// Check whether a value carries the reference marker.
    ///
    /// This only looks for the marker; the payload may still be malformed.
    pub fn is_reference(value: &Value) -> bool {
        match value {
            Value::Map(m) => m.contains_key(REF_KEY),
            _ => false,
        }
    }

    /// Try to parse a reference out of a value.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - The value carries no marker.
    /// * `Ok(Some(reference))` - The marker's payload is a valid path.
    /// * `Err(Error::InvalidReference)` - The marker is present but its
    ///   payload is not a path. `at` is the path the value was found at.
    pub fn from_value_at(value: &Value, at: &Path) -> Result<Option<Self>, Error> {
        let payload = match value {
            Value::Map(m) => match m.get(REF_KEY) {
                Some(payload) => payload,
                None => return Ok(None),
            },
            _ => return Ok(None),
        };

        let invalid = |message: String| Error::InvalidReference {
            path: at.clone(),
            message,
        };

        let target = match payload {
            Value::String(s) => Path::parse(s).map_err(|e| invalid(e.to_string()))?,
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(Segment::Key(s.clone())),
                    Value::Integer(i) => usize::try_from(*i)
                        .map(Segment::Index)
                        .map_err(|_| invalid(format!("negative index {} in reference", i))),
                    other => Err(invalid(format!("unsupported segment {:?} in reference", other))),
                })
                .collect::<Result<Path, Error>>()?,
            other => {
                return Err(invalid(format!(
                    "reference payload must be a path string or segment array, got {:?}",
                    other
                )))
            }
        };

        Ok(Some(Self { target }))
    }

    /// [`Reference::from_value_at`] without location information.
    pub fn from_value(value: &Value) -> Result<Option<Self>, Error> {
        Self::from_value_at(value, &Path::root())
    }
}

impl From<Path> for Reference {
    fn from(target: Path) -> Self {
        Self::new(target)
    }
}
