//! In-memory store over a single `Value` tree.
//!
//! No pattern logic: queries are resolved directly against the data.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::expand::expand_concrete;
use crate::stream::{self, PathValueStream};
use crate::{Deleter, Error, Path, PathValue, Reader, Segment, Value, Writer};

/// A store holding one `Value` tree behind a mutex.
///
/// Clones share the same tree.
///
/// # Example
///
/// ```rust
/// use futures::TryStreamExt;
/// use patternfs_core_store::{path, InMemoryStore, PathValue, Reader, Writer};
///
/// # futures::executor::block_on(async {
/// let store = InMemoryStore::new();
/// store
///     .write(PathValue::new(path!("users/alice/name"), "Alice"))
///     .try_collect::<Vec<_>>()
///     .await
///     .unwrap();
///
/// let found: Vec<PathValue> = store.read(&path!("users/*/name")).try_collect().await.unwrap();
/// assert_eq!(found, vec![PathValue::new(path!("users/alice/name"), "Alice")]);
/// # });
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStore {
    root: Arc<Mutex<Value>>,
}

impl InMemoryStore {
    /// Create a new store with an empty map at the root.
    pub fn new() -> Self {
        Self::with_data(Value::map())
    }

    /// Create a store with initial data.
    pub fn with_data(root: Value) -> Self {
        Self {
            root: Arc::new(Mutex::new(root)),
        }
    }

    /// A copy of the current tree.
    pub fn snapshot(&self) -> Result<Value, Error> {
        Ok(lock(&self.root)?.clone())
    }
}

fn lock(root: &Mutex<Value>) -> Result<MutexGuard<'_, Value>, Error> {
    root.lock().map_err(|_| Error::other("lock poisoned"))
}

/// Resolve a query against data, one path-value per concrete leaf.
///
/// Key sets and ranges name leaves whether or not they exist (missing
/// leaves come back absent); wildcards only name what exists.
fn select(node: Option<&Value>, at: Path, rest: &[Segment], out: &mut Vec<PathValue>) {
    let Some((head, tail)) = rest.split_first() else {
        out.push(PathValue {
            path: at,
            value: node.cloned(),
        });
        return;
    };

    match head {
        Segment::Wildcard => match node {
            Some(Value::Map(map)) => {
                for (key, child) in map {
                    select(Some(child), at.child(Segment::Key(key.clone())), tail, out);
                }
            }
            Some(Value::Array(items)) => {
                for (i, child) in items.iter().enumerate() {
                    select(Some(child), at.child(i), tail, out);
                }
            }
            _ => {}
        },
        head => {
            for segment in head.expand() {
                let child = node.and_then(|n| n.child(&segment));
                select(child, at.child(segment), tail, out);
            }
        }
    }
}

impl Reader for InMemoryStore {
    fn read(&self, query: &Path) -> PathValueStream {
        let root = self.root.clone();
        let query = query.clone();
        stream::deferred(move || {
            let data = lock(&root)?;
            let mut out = Vec::new();
            select(Some(&*data), Path::root(), &query.segments, &mut out);
            Ok(out)
        })
    }
}

impl Writer for InMemoryStore {
    /// Writes the value at every path the query expands to.
    ///
    /// An absent value is written as `Null`. Targets are written in order;
    /// if one fails, the writes already made stay and are echoed before the
    /// error.
    fn write(&self, pv: PathValue) -> PathValueStream {
        let root = self.root.clone();
        stream::defer(move || {
            let (query, value) = pv.into_parts();
            let value = value.unwrap_or_default();
            let targets = match expand_concrete(&query) {
                Ok(targets) => targets,
                Err(e) => return stream::fail(e),
            };

            let mut data = match lock(&root) {
                Ok(data) => data,
                Err(e) => return stream::fail(e),
            };
            let mut out = Vec::with_capacity(targets.len());
            for path in targets {
                log::debug!("Writing {}...", path);
                if let Err(e) = data.set(&path, value.clone()) {
                    return stream::concat(vec![stream::iter(out), stream::fail(e)]);
                }
                out.push(PathValue::new(path, value.clone()));
            }
            stream::iter(out)
        })
    }
}

impl Deleter for InMemoryStore {
    /// Removes everything the query names, echoing the removed values.
    fn delete(&self, query: &Path) -> PathValueStream {
        let root = self.root.clone();
        let query = query.clone();
        stream::deferred(move || {
            let mut data = lock(&root)?;
            let mut targets = Vec::new();
            select(Some(&*data), Path::root(), &query.segments, &mut targets);

            // Later siblings first so array removals don't shift pending targets
            let mut order: Vec<usize> = (0..targets.len()).collect();
            order.sort_by(|a, b| targets[*b].path.cmp(&targets[*a].path));
            for i in order {
                let target = &mut targets[i];
                if target.value.is_some() {
                    log::debug!("Deleting {}...", target.path);
                    target.value = data.remove(&target.path)?;
                }
            }
            Ok(targets)
        })
    }
}
