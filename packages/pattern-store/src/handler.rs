//! Handlers: a pattern, the operations it accepts, and what it does.
//!
//! The dispatcher only sees the [`Handler`] trait. Two kinds ship here:
//! [`ActionHandler`] runs a closure, [`AliasHandler`] answers reads with a
//! reference to another path.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use patternfs_core_store::stream::{self, PathValueStream};
use patternfs_core_store::{Error, Operation, Path, PathValue, Reference, Segment, Value};

use crate::capabilities::Capabilities;
use crate::pattern::{Captures, Pattern};

/// Everything a handler learned while matching, handed back to `run`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchContext {
    operation: Operation,
    path: Path,
    captures: Captures,
}

impl MatchContext {
    pub fn new(operation: Operation, path: Path, captures: Captures) -> Self {
        Self {
            operation,
            path,
            captures,
        }
    }

    /// The operation being dispatched.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// The matched prefix of the query.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn captures(&self) -> &Captures {
        &self.captures
    }

    /// The segment bound to `:name`.
    pub fn capture(&self, name: &str) -> Option<&Segment> {
        self.captures.named.get(name)
    }

    /// The `i`th segment bound by `*` or `{..}`.
    pub fn wildcard(&self, i: usize) -> Option<&Segment> {
        self.captures.positional.get(i)
    }
}

/// Intercepts operations on paths whose prefix matches a fixed-length
/// pattern.
///
/// # Object Safety
///
/// This trait is object-safe; the registry stores `Arc<dyn Handler>`.
pub trait Handler: Send + Sync {
    /// Number of leading query segments this handler inspects.
    fn pattern_len(&self) -> usize;

    /// Return a context iff `op` is accepted and `prefix` (exactly
    /// `pattern_len` segments) satisfies the pattern. Must be pure.
    fn matches(&self, op: Operation, prefix: &Path) -> Option<MatchContext>;

    /// Produce the results for a match. `input` is the written value for
    /// writes and `None` otherwise. Failures are `Err` items on the stream.
    fn run(&self, context: MatchContext, input: Option<Value>) -> PathValueStream;
}

fn match_pattern(
    pattern: &Pattern,
    capabilities: Capabilities,
    op: Operation,
    prefix: &Path,
) -> Option<MatchContext> {
    if !capabilities.contains(op) {
        return None;
    }
    pattern
        .matches(prefix)
        .map(|captures| MatchContext::new(op, prefix.clone(), captures))
}

/// The closure behind an [`ActionHandler`].
pub type Action = Arc<dyn Fn(MatchContext, Option<Value>) -> PathValueStream + Send + Sync>;

/// A handler that runs a closure.
///
/// # Example
///
/// ```rust
/// use patternfs_pattern_store::{pattern, ActionHandler, Capabilities};
/// use patternfs_core_store::Value;
///
/// // Reads of `clock/now` are answered by computation, not storage.
/// let clock = ActionHandler::value(Capabilities::READ, pattern!("clock/now"), |_, _| {
///     Ok(Value::Integer(1_700_000_000))
/// });
/// ```
#[derive(Clone)]
pub struct ActionHandler {
    pattern: Pattern,
    capabilities: Capabilities,
    action: Action,
}

impl ActionHandler {
    /// A handler whose action returns a stream of results.
    pub fn new<F>(capabilities: Capabilities, pattern: Pattern, action: F) -> Self
    where
        F: Fn(MatchContext, Option<Value>) -> PathValueStream + Send + Sync + 'static,
    {
        Self {
            pattern,
            capabilities,
            action: Arc::new(action),
        }
    }

    /// A handler producing exactly one value at the matched prefix.
    pub fn value<F>(capabilities: Capabilities, pattern: Pattern, compute: F) -> Self
    where
        F: Fn(&MatchContext, Option<Value>) -> Result<Value, Error> + Send + Sync + 'static,
    {
        Self::new(capabilities, pattern, move |context, input| {
            let result =
                compute(&context, input).map(|value| PathValue::new(context.path().clone(), value));
            stream::once(result)
        })
    }

    /// A handler whose action is asynchronous.
    pub fn future<F, Fut>(capabilities: Capabilities, pattern: Pattern, action: F) -> Self
    where
        F: Fn(MatchContext, Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<PathValue>, Error>> + Send + 'static,
    {
        Self::new(capabilities, pattern, move |context, input| {
            stream::from_future(action(context, input))
        })
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }
}

impl fmt::Debug for ActionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionHandler")
            .field("pattern", &self.pattern.to_string())
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl Handler for ActionHandler {
    fn pattern_len(&self) -> usize {
        self.pattern.len()
    }

    fn matches(&self, op: Operation, prefix: &Path) -> Option<MatchContext> {
        match_pattern(&self.pattern, self.capabilities, op, prefix)
    }

    fn run(&self, context: MatchContext, input: Option<Value>) -> PathValueStream {
        (self.action)(context, input)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum TargetSegment {
    Literal(Segment),
    Capture(String),
}

/// A read-only symbolic link.
///
/// Reads matching the pattern yield a reference value at the matched
/// prefix; the dispatcher then follows it, re-applying whatever part of
/// the query the pattern did not consume. `:name` components in the target
/// are replaced by the segment captured under that name.
///
/// ```rust
/// use patternfs_pattern_store::{pattern, AliasHandler};
///
/// // `me/...` reads as `users/alice/...`
/// let me = AliasHandler::new(pattern!("me"), "users/alice").unwrap();
///
/// // `u/<id>/...` reads as `users/<id>/...`
/// let short = AliasHandler::new(pattern!("u/:id"), "users/:id").unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct AliasHandler {
    pattern: Pattern,
    target: Vec<TargetSegment>,
}

impl AliasHandler {
    /// Alias `pattern` to `target`.
    ///
    /// Fails if the target is not a valid path or names a capture the
    /// pattern does not bind.
    pub fn new(pattern: Pattern, target: &str) -> Result<Self, Error> {
        let invalid = |message: String| Error::InvalidPattern {
            pattern: format!("{} -> {}", pattern, target),
            message,
        };

        let target = target
            .split('/')
            .filter(|c| !c.is_empty())
            .map(|component| match component.strip_prefix(':') {
                Some(name) if pattern.capture_names().any(|n| n == name) => {
                    Ok(TargetSegment::Capture(name.to_string()))
                }
                Some(name) => Err(invalid(format!("pattern does not capture '{}'", name))),
                None => Segment::parse(component)
                    .map(TargetSegment::Literal)
                    .map_err(|e| invalid(e.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { pattern, target })
    }

    fn target_for(&self, context: &MatchContext) -> Result<Path, Error> {
        self.target
            .iter()
            .map(|segment| match segment {
                TargetSegment::Literal(segment) => Ok(segment.clone()),
                TargetSegment::Capture(name) => context
                    .capture(name)
                    .cloned()
                    .ok_or_else(|| Error::handler(context.path(), format!("no capture '{}'", name))),
            })
            .collect()
    }
}

impl Handler for AliasHandler {
    fn pattern_len(&self) -> usize {
        self.pattern.len()
    }

    fn matches(&self, op: Operation, prefix: &Path) -> Option<MatchContext> {
        match_pattern(&self.pattern, Capabilities::READ, op, prefix)
    }

    fn run(&self, context: MatchContext, _input: Option<Value>) -> PathValueStream {
        let result = self.target_for(&context).map(|target| {
            PathValue::new(context.path().clone(), Reference::new(target).to_value())
        });
        stream::once(result)
    }
}
