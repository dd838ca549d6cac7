//! Path type: an ordered sequence of segments.
//!
//! A `Path` doubles as a query. Concrete paths contain only keys and
//! indices; queries may also contain key sets, index ranges and wildcards,
//! which [`expand`](crate::expand) turns into concrete paths.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors related to path parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// A path component is not a valid segment.
    #[error("invalid path component '{component}' at position {position}: {message}")]
    InvalidComponent {
        component: String,
        position: usize,
        message: String,
    },
    /// The path string is invalid.
    #[error("invalid path: {message}")]
    InvalidPath { message: String },
}

/// A single step in a path.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Segment {
    /// A map key. Must be a Unicode identifier when parsed from text.
    Key(String),
    /// An array index (pure digits in text form).
    Index(usize),
    /// Any of several keys or indices: `{a,b,0}`.
    Keys(Vec<String>),
    /// Half-open index range: `[2..5]`.
    Range { start: usize, end: usize },
    /// Any single segment: `*`.
    Wildcard,
}

impl Segment {
    /// Create a key segment without validation.
    pub fn key(key: impl Into<String>) -> Self {
        Segment::Key(key.into())
    }

    /// Parse a single textual component.
    pub fn parse(component: &str) -> Result<Self, PathError> {
        Self::parse_at(component, 0)
    }

    fn parse_at(component: &str, position: usize) -> Result<Self, PathError> {
        let invalid = |message: String| PathError::InvalidComponent {
            component: component.to_string(),
            position,
            message,
        };

        if component == "*" {
            return Ok(Segment::Wildcard);
        }

        if let Some(inner) = component
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
        {
            let keys: Vec<String> = inner
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect();
            for key in &keys {
                Self::concrete_at(key, position).map_err(|e| match e {
                    PathError::InvalidComponent { message, .. } => invalid(message),
                    other => other,
                })?;
            }
            return Ok(Segment::Keys(keys));
        }

        if let Some(inner) = component
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            let (start, end) = inner
                .split_once("..")
                .ok_or_else(|| invalid("range must look like [start..end]".to_string()))?;
            let start: usize = start
                .trim()
                .parse()
                .map_err(|_| invalid(format!("invalid range start '{}'", start)))?;
            let end: usize = end
                .trim()
                .parse()
                .map_err(|_| invalid(format!("invalid range end '{}'", end)))?;
            if start > end {
                return Err(invalid(format!("range start {} is after end {}", start, end)));
            }
            return Ok(Segment::Range { start, end });
        }

        Self::concrete_at(component, position)
    }

    /// Parse a key or index, rejecting query-only syntax.
    fn concrete_at(component: &str, position: usize) -> Result<Self, PathError> {
        let invalid = |message: &str| PathError::InvalidComponent {
            component: component.to_string(),
            position,
            message: message.to_string(),
        };

        if component.is_empty() {
            return Err(invalid("empty component"));
        }

        // Pure numeric strings address array elements
        if component.chars().all(|c| c.is_ascii_digit()) {
            return component
                .parse()
                .map(Segment::Index)
                .map_err(|_| invalid("index out of range"));
        }

        let mut chars = component.chars();
        let Some(first) = chars.next() else {
            return Err(invalid("empty component"));
        };

        let valid_start = unicode_ident::is_xid_start(first)
            || (first == '_'
                && chars
                    .clone()
                    .next()
                    .is_some_and(unicode_ident::is_xid_continue));

        if !valid_start {
            return Err(invalid(
                "must start with a letter or underscore followed by letter/digit",
            ));
        }

        for c in chars {
            if !unicode_ident::is_xid_continue(c) {
                return Err(PathError::InvalidComponent {
                    component: component.to_string(),
                    position,
                    message: format!("invalid character '{}' in identifier", c),
                });
            }
        }

        Ok(Segment::Key(component.to_string()))
    }

    /// True for keys and indices.
    pub fn is_concrete(&self) -> bool {
        matches!(self, Segment::Key(_) | Segment::Index(_))
    }

    /// The concrete segments this segment stands for.
    ///
    /// Key sets and ranges fan out; keys, indices and wildcards stand for
    /// themselves, since a wildcard can only be resolved against data.
    pub fn expand(&self) -> Vec<Segment> {
        match self {
            Segment::Keys(keys) => keys
                .iter()
                .map(|k| match k.parse::<usize>() {
                    Ok(i) if k.chars().all(|c| c.is_ascii_digit()) => Segment::Index(i),
                    _ => Segment::Key(k.clone()),
                })
                .collect(),
            Segment::Range { start, end } => (*start..*end).map(Segment::Index).collect(),
            other => vec![other.clone()],
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => write!(f, "{}", k),
            Segment::Index(i) => write!(f, "{}", i),
            Segment::Keys(keys) => write!(f, "{{{}}}", keys.join(",")),
            Segment::Range { start, end } => write!(f, "[{}..{}]", start, end),
            Segment::Wildcard => write!(f, "*"),
        }
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

/// A path (or query) in PatternFS.
///
/// Order is significant and defines nesting depth.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Path {
    pub segments: Vec<Segment>,
}

impl Path {
    /// The root path (no segments).
    pub fn root() -> Self {
        Path::default()
    }

    /// Create a path from segments.
    pub fn new(segments: Vec<Segment>) -> Self {
        Path { segments }
    }

    /// Parse a path string.
    ///
    /// # Path Syntax
    ///
    /// - Components are separated by `/`
    /// - Empty components are ignored (normalizes `//` and trailing `/`)
    /// - `*` is a wildcard, `{a,b}` a key set, `[0..3]` an index range
    /// - Pure digits are indices; anything else must be an identifier
    ///
    /// # Examples
    ///
    /// ```rust
    /// use patternfs_core_store::{Path, Segment};
    ///
    /// let path = Path::parse("users/{alice,bob}/posts/0").unwrap();
    /// assert_eq!(path.len(), 4);
    /// assert_eq!(path[3], Segment::Index(0));
    ///
    /// assert_eq!(Path::parse("foo/bar/").unwrap(), Path::parse("foo/bar").unwrap());
    /// ```
    pub fn parse(s: &str) -> Result<Self, PathError> {
        let segments = s
            .split('/')
            .filter(|c| !c.is_empty())
            .enumerate()
            .map(|(i, c)| Segment::parse_at(c, i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Path { segments })
    }

    /// Check if this path is empty (root path).
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Get the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Iterate over segments.
    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    /// True if every segment is a key or an index.
    pub fn is_concrete(&self) -> bool {
        self.segments.iter().all(Segment::is_concrete)
    }

    /// Append a segment in place.
    pub fn push(&mut self, segment: impl Into<Segment>) {
        self.segments.push(segment.into());
    }

    /// A new path with one more segment.
    #[must_use]
    pub fn child(&self, segment: impl Into<Segment>) -> Path {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    /// Join this path with another.
    #[must_use]
    pub fn join(&self, other: &Path) -> Path {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Path { segments }
    }

    /// Check if this path has the given prefix.
    pub fn has_prefix(&self, prefix: &Path) -> bool {
        prefix.segments.len() <= self.segments.len()
            && prefix.segments == self.segments[..prefix.segments.len()]
    }

    /// Strip a prefix from this path.
    ///
    /// Returns `None` if the prefix doesn't match.
    #[must_use]
    pub fn strip_prefix(&self, prefix: &Path) -> Option<Path> {
        if self.has_prefix(prefix) {
            Some(Path {
                segments: self.segments[prefix.segments.len()..].to_vec(),
            })
        } else {
            None
        }
    }

    /// Segments `start..end` as a new path.
    ///
    /// Bounds are clamped to the path; an empty or inverted range gives the
    /// root path.
    pub fn slice(&self, start: usize, end: usize) -> Path {
        let end = end.min(self.len());
        let start = start.min(end);
        Path {
            segments: self.segments[start..end].to_vec(),
        }
    }

    /// Everything after the first `n` segments.
    pub fn tail(&self, n: usize) -> Path {
        self.slice(n, self.len())
    }

    /// True if the textual form parses back to this exact path.
    ///
    /// Keys built with [`Segment::key`] skip validation, so a key such as
    /// `user-1` or a numeric key like `"12"` has no faithful textual form.
    pub fn has_text_form(&self) -> bool {
        Path::parse(&self.to_string()).map_or(false, |parsed| parsed == *self)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl From<Vec<Segment>> for Path {
    fn from(segments: Vec<Segment>) -> Self {
        Path { segments }
    }
}

impl FromIterator<Segment> for Path {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Path {
            segments: iter.into_iter().collect(),
        }
    }
}

/// Serialized path: its string form when that parses back, otherwise an
/// array of literal keys and indices.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PathRepr {
    Text(String),
    Segments(Vec<SegmentRepr>),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SegmentRepr {
    Index(usize),
    Key(String),
}

impl Serialize for Path {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let repr = if self.has_text_form() {
            PathRepr::Text(self.to_string())
        } else {
            PathRepr::Segments(
                self.segments
                    .iter()
                    .map(|segment| match segment {
                        Segment::Index(i) => SegmentRepr::Index(*i),
                        Segment::Key(k) => SegmentRepr::Key(k.clone()),
                        other => SegmentRepr::Key(other.to_string()),
                    })
                    .collect(),
            )
        };
        repr.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match PathRepr::deserialize(deserializer)? {
            PathRepr::Text(s) => Path::parse(&s).map_err(serde::de::Error::custom),
            PathRepr::Segments(segments) => Ok(segments
                .into_iter()
                .map(|segment| match segment {
                    SegmentRepr::Index(i) => Segment::Index(i),
                    SegmentRepr::Key(k) => Segment::Key(k),
                })
                .collect()),
        }
    }
}

impl std::ops::Index<usize> for Path {
    type Output = Segment;

    fn index(&self, i: usize) -> &Self::Output {
        &self.segments[i]
    }
}

/// Macro for creating paths from literals.
///
/// # Example
///
/// ```rust
/// use patternfs_core_store::path;
///
/// let p = path!("users/123/name");
/// assert_eq!(p.len(), 3);
/// ```
#[macro_export]
macro_rules! path {
    ($s:expr) => {
        $crate::Path::parse($s).expect("invalid path literal")
    };
}
