//! Handler patterns: one matcher per path segment.

use std::collections::BTreeMap;
use std::fmt;

use patternfs_core_store::{Error, Path, Segment};

/// Matches a single path segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Matcher {
    /// Exactly this key or index.
    Exact(Segment),
    /// Any one of these keys or indices. Captured positionally.
    OneOf(Vec<Segment>),
    /// Any single segment. Captured positionally.
    Any,
    /// Any single segment, captured under a name.
    Capture(String),
}

impl Matcher {
    fn parse(component: &str, pattern: &str) -> Result<Self, Error> {
        let invalid = |message: String| Error::InvalidPattern {
            pattern: pattern.to_string(),
            message,
        };

        if component == "*" {
            return Ok(Matcher::Any);
        }

        if let Some(name) = component.strip_prefix(':') {
            return match Segment::parse(name) {
                Ok(Segment::Key(name)) => Ok(Matcher::Capture(name)),
                _ => Err(invalid(format!("invalid capture name '{}'", name))),
            };
        }

        match Segment::parse(component).map_err(|e| invalid(e.to_string()))? {
            keys @ Segment::Keys(_) => {
                let choices = keys.expand();
                if choices.is_empty() {
                    return Err(invalid("empty key set".to_string()));
                }
                Ok(Matcher::OneOf(choices))
            }
            segment if segment.is_concrete() => Ok(Matcher::Exact(segment)),
            other => Err(invalid(format!("'{}' cannot be used in a pattern", other))),
        }
    }

    /// Test one segment, recording captures on success.
    fn accept(&self, segment: &Segment, captures: &mut Captures) -> bool {
        match self {
            Matcher::Exact(expected) => expected == segment,
            Matcher::OneOf(choices) => {
                let hit = choices.contains(segment);
                if hit {
                    captures.positional.push(segment.clone());
                }
                hit
            }
            Matcher::Any => {
                captures.positional.push(segment.clone());
                true
            }
            Matcher::Capture(name) => {
                captures.named.insert(name.clone(), segment.clone());
                true
            }
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Exact(segment) => write!(f, "{}", segment),
            Matcher::OneOf(choices) => {
                let names: Vec<String> = choices.iter().map(ToString::to_string).collect();
                write!(f, "{{{}}}", names.join(","))
            }
            Matcher::Any => f.write_str("*"),
            Matcher::Capture(name) => write!(f, ":{}", name),
        }
    }
}

/// Segments bound while matching a pattern.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Captures {
    /// Bindings of `:name` matchers.
    pub named: BTreeMap<String, Segment>,
    /// Bindings of `*` and `{..}` matchers, in pattern order.
    pub positional: Vec<Segment>,
}

/// A fixed-length sequence of matchers.
///
/// # Syntax
///
/// `/`-separated components: `name` or `12` match exactly, `*` matches any
/// segment, `:name` matches any segment and captures it, `{a,b}` matches
/// any listed key.
///
/// ```rust
/// use patternfs_pattern_store::Pattern;
/// use patternfs_core_store::{path, Segment};
///
/// let pattern = Pattern::parse("users/:id/{posts,likes}").unwrap();
/// assert_eq!(pattern.len(), 3);
///
/// let captures = pattern.matches(&path!("users/alice/posts")).unwrap();
/// assert_eq!(captures.named["id"], Segment::key("alice"));
/// assert!(pattern.matches(&path!("users/alice/friends")).is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    matchers: Vec<Matcher>,
}

impl Pattern {
    /// Build a pattern from matchers. At least one is required.
    pub fn new(matchers: Vec<Matcher>) -> Result<Self, Error> {
        if matchers.is_empty() {
            return Err(Error::InvalidPattern {
                pattern: String::new(),
                message: "a pattern must cover at least one segment".to_string(),
            });
        }
        Ok(Self { matchers })
    }

    /// Parse the textual pattern syntax.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let matchers = s
            .split('/')
            .filter(|c| !c.is_empty())
            .map(|c| Matcher::parse(c, s))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(matchers).map_err(|e| match e {
            Error::InvalidPattern { message, .. } => Error::InvalidPattern {
                pattern: s.to_string(),
                message,
            },
            other => other,
        })
    }

    /// Number of segments this pattern covers.
    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    /// Names of all `:name` captures.
    pub fn capture_names(&self) -> impl Iterator<Item = &str> {
        self.matchers.iter().filter_map(|m| match m {
            Matcher::Capture(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Match a path of exactly this pattern's length.
    pub fn matches(&self, prefix: &Path) -> Option<Captures> {
        if prefix.len() != self.matchers.len() {
            return None;
        }
        let mut captures = Captures::default();
        self.matchers
            .iter()
            .zip(prefix.iter())
            .all(|(matcher, segment)| matcher.accept(segment, &mut captures))
            .then_some(captures)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.matchers.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join("/"))
    }
}

impl std::str::FromStr for Pattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::parse(s)
    }
}

/// Macro for creating patterns from literals.
///
/// Panics on a malformed literal, like `path!`.
#[macro_export]
macro_rules! pattern {
    ($s:expr) => {
        $crate::Pattern::parse($s).expect("invalid pattern literal")
    };
}
