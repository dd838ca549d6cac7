//! The handler matrix: handlers bucketed by pattern length.

use std::sync::Arc;

use patternfs_core_store::{Error, Operation, Path};

use crate::handler::{Handler, MatchContext};

/// A handler that claimed a query.
pub struct Claim {
    pub handler: Arc<dyn Handler>,
    pub context: MatchContext,
    /// How many leading query segments the handler matched.
    pub consumed: usize,
}

/// Handlers indexed by the exact prefix length they match.
///
/// `buckets[n - 1]` holds every handler of pattern length `n`, in
/// registration order. Lookup walks query prefixes shortest first and
/// tests at most one bucket per length.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    buckets: Vec<Vec<Arc<dyn Handler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler to the bucket for its pattern length.
    pub fn register(&mut self, handler: Arc<dyn Handler>) -> Result<(), Error> {
        let len = handler.pattern_len();
        if len == 0 {
            return Err(Error::InvalidPattern {
                pattern: String::new(),
                message: "a handler must match at least one segment".to_string(),
            });
        }
        if self.buckets.len() < len {
            self.buckets.resize_with(len, Vec::new);
        }
        self.buckets[len - 1].push(handler);
        Ok(())
    }

    /// Handlers of exactly pattern length `len`, in registration order.
    pub fn bucket(&self, len: usize) -> &[Arc<dyn Handler>] {
        len.checked_sub(1)
            .and_then(|i| self.buckets.get(i))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of registered handlers.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }

    /// Find the handler that owns `query` for `op`.
    ///
    /// Prefixes are tried shortest first; within a length, handlers are
    /// tried in registration order. The first match wins outright, so a
    /// shorter pattern shadows any longer one sharing its leading segments.
    pub fn find(&self, op: Operation, query: &Path) -> Option<Claim> {
        let mut current = Path::root();
        for (i, segment) in query.iter().enumerate() {
            current.push(segment.clone());
            let n = i + 1;
            if n > self.buckets.len() {
                break;
            }
            for handler in self.bucket(n) {
                if let Some(context) = handler.matches(op, &current) {
                    return Some(Claim {
                        handler: handler.clone(),
                        context,
                        consumed: n,
                    });
                }
            }
        }
        None
    }
}
