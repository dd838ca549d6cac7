//! PatternStore: route operations to handlers by path pattern.
//!
//! Handlers are bucketed by pattern length. A query is offered to its
//! prefixes shortest first; the first handler that matches owns the whole
//! operation. Reads additionally follow references found in handler
//! results, re-applying the unconsumed rest of the query at the target.

use std::sync::Arc;

use futures::StreamExt;
use log::{debug, trace};

use patternfs_core_store::stream::{self, PathValueStream};
use patternfs_core_store::{
    expand, Deleter, Error, Operation, Path, PathValue, Reader, Store, StoreRef, Value, Writer,
};

use crate::capabilities::Capabilities;
use crate::config::DispatchConfig;
use crate::handler::{ActionHandler, AliasHandler, Handler, MatchContext};
use crate::pattern::Pattern;
use crate::registry::HandlerRegistry;

/// A store whose paths are served by registered handlers.
///
/// Clones are cheap and share the same handlers. Handlers are registered up
/// front with the builder methods and never change afterwards.
///
/// # Example
///
/// ```rust
/// use futures::TryStreamExt;
/// use patternfs_core_store::{path, PathValue, Reader, Value};
/// use patternfs_pattern_store::{pattern, Capabilities, PatternStore};
///
/// # futures::executor::block_on(async {
/// let store = PatternStore::new()
///     .handle_fn(Capabilities::READ, pattern!("answer"), |_, _| Ok(Value::Integer(42)))
///     .unwrap();
///
/// let results: Vec<PathValue> = store.read(&path!("answer")).try_collect().await.unwrap();
/// assert_eq!(results, vec![PathValue::new(path!("answer"), 42i64)]);
///
/// // Nothing claims `other`, so it comes back as a path-only placeholder.
/// let results: Vec<PathValue> = store.read(&path!("other")).try_collect().await.unwrap();
/// assert_eq!(results, vec![PathValue::absent(path!("other"))]);
/// # });
/// ```
#[derive(Clone, Default)]
pub struct PatternStore {
    registry: Arc<HandlerRegistry>,
    config: DispatchConfig,
    fallback: Option<StoreRef>,
}

impl PatternStore {
    /// Create a store with no handlers and the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Send unclaimed operations to `store` instead of yielding placeholders.
    #[must_use]
    pub fn with_fallback<S: Store + 'static>(mut self, store: S) -> Self {
        self.fallback = Some(Arc::new(store));
        self
    }

    /// Register a pre-built handler.
    ///
    /// Handlers of equal pattern length are tried in registration order.
    pub fn handle<H: Handler + 'static>(mut self, handler: H) -> Result<Self, Error> {
        Arc::make_mut(&mut self.registry).register(Arc::new(handler))?;
        Ok(self)
    }

    /// Register a handler built from raw pieces.
    pub fn handle_fn<F>(
        self,
        capabilities: Capabilities,
        pattern: Pattern,
        compute: F,
    ) -> Result<Self, Error>
    where
        F: Fn(&MatchContext, Option<Value>) -> Result<Value, Error> + Send + Sync + 'static,
    {
        self.handle(ActionHandler::value(capabilities, pattern, compute))
    }

    /// Register a read alias from `pattern` to `target`.
    pub fn alias(self, pattern: Pattern, target: &str) -> Result<Self, Error> {
        let handler = AliasHandler::new(pattern, target)?;
        self.handle(handler)
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Dispatch one operation. Nothing runs until the stream is polled, and
    /// the stream ends after its first error.
    fn dispatch(&self, op: Operation, query: Path, value: Option<Value>, depth: usize) -> PathValueStream {
        let store = self.clone();
        stream::stop_after_error(stream::defer(move || {
            store.dispatch_now(op, query, value, depth)
        }))
    }

    fn dispatch_now(
        &self,
        op: Operation,
        query: Path,
        value: Option<Value>,
        depth: usize,
    ) -> PathValueStream {
        let Some(claim) = self.registry.find(op, &query) else {
            return self.fall_back(op, query, value);
        };

        debug!(
            "{} '{}' claimed by handler at prefix '{}'",
            op,
            query,
            claim.context.path()
        );
        let results = claim.handler.run(claim.context, value);
        if op != Operation::Read {
            return results;
        }

        let rest = query.tail(claim.consumed);
        let store = self.clone();
        results
            .flat_map(move |item| match item {
                Ok(pv) => store.follow_reference(pv, &rest, depth),
                Err(e) => stream::fail(e),
            })
            .boxed()
    }

    /// Emit `pv`, then whatever its reference resolves to.
    fn follow_reference(&self, pv: PathValue, rest: &Path, depth: usize) -> PathValueStream {
        let reference = match pv.reference() {
            Ok(Some(reference)) => reference,
            Ok(None) => return stream::once(Ok(pv)),
            Err(e) => return stream::concat(vec![stream::once(Ok(pv)), stream::fail(e)]),
        };

        let target = reference.target.join(rest);
        if let Some(limit) = self.config.max_reference_depth {
            if depth >= limit {
                let error = Error::ReferenceDepthExceeded {
                    path: target,
                    limit,
                };
                return stream::concat(vec![stream::once(Ok(pv)), stream::fail(error)]);
            }
        }

        trace!("following reference at '{}' to '{}'", pv.path, target);
        stream::once(Ok(pv))
            .chain(self.dispatch(Operation::Read, target, None, depth + 1))
            .boxed()
    }

    fn fall_back(&self, op: Operation, query: Path, value: Option<Value>) -> PathValueStream {
        if let Some(store) = &self.fallback {
            debug!("{} '{}' unclaimed, delegating to fallback store", op, query);
            return match op {
                Operation::Read => store.read(&query),
                Operation::Write => store.write(PathValue { path: query, value }),
                Operation::Delete => store.delete(&query),
            };
        }

        debug!("{} '{}' unclaimed, yielding placeholders", op, query);
        stream::iter(expand(&query).into_iter().map(PathValue::absent).collect())
    }
}

impl Reader for PatternStore {
    fn read(&self, query: &Path) -> PathValueStream {
        self.dispatch(Operation::Read, query.clone(), None, 0)
    }
}

impl Writer for PatternStore {
    fn write(&self, pv: PathValue) -> PathValueStream {
        self.dispatch(Operation::Write, pv.path, pv.value, 0)
    }
}

impl Deleter for PatternStore {
    fn delete(&self, query: &Path) -> PathValueStream {
        self.dispatch(Operation::Delete, query.clone(), None, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern;
    use futures::TryStreamExt;
    use patternfs_core_store::{path, InMemoryStore, Reference};
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn collect(s: PathValueStream) -> Vec<PathValue> {
        s.try_collect().await.unwrap()
    }

    async fn collect_all(s: PathValueStream) -> Vec<Result<PathValue, Error>> {
        s.collect().await
    }

    fn tagged(tag: &'static str) -> impl Fn(&MatchContext, Option<Value>) -> Result<Value, Error> {
        move |_, _| Ok(Value::from(tag))
    }

    fn counted(
        calls: Arc<AtomicUsize>,
        tag: &'static str,
    ) -> impl Fn(&MatchContext, Option<Value>) -> Result<Value, Error> {
        move |_, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Value::from(tag))
        }
    }

    #[tokio::test]
    async fn shorter_prefix_claims_before_longer() {
        let long_calls = Arc::new(AtomicUsize::new(0));
        let store = PatternStore::new()
            .handle_fn(Capabilities::READ, pattern!("a"), tagged("short"))
            .unwrap()
            .handle_fn(Capabilities::READ, pattern!("a/b"), counted(long_calls.clone(), "long"))
            .unwrap();

        let results = collect(store.read(&path!("a/b"))).await;
        assert_eq!(results, vec![PathValue::new(path!("a"), "short")]);
        assert_eq!(long_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn first_registered_wins_at_equal_length() {
        let second_calls = Arc::new(AtomicUsize::new(0));
        let store = PatternStore::new()
            .handle_fn(Capabilities::READ, pattern!("a"), tagged("first"))
            .unwrap()
            .handle_fn(Capabilities::READ, pattern!("a"), counted(second_calls.clone(), "second"))
            .unwrap();

        let results = collect(store.read(&path!("a"))).await;
        assert_eq!(results, vec![PathValue::new(path!("a"), "first")]);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unclaimed_queries_expand_to_placeholders() {
        let store = PatternStore::new()
            .handle_fn(Capabilities::READ, pattern!("other"), tagged("x"))
            .unwrap();

        let query = path!("users/{alice,bob}/tags/[0..2]");
        let results = collect(store.read(&query)).await;
        let expected: Vec<PathValue> = expand(&query).into_iter().map(PathValue::absent).collect();
        assert_eq!(results.len(), 4);
        assert_eq!(results, expected);

        let deleted = collect(store.delete(&path!("gone"))).await;
        assert_eq!(deleted, vec![PathValue::absent(path!("gone"))]);
    }

    #[tokio::test]
    async fn references_continue_with_unconsumed_tail() {
        let store = PatternStore::new()
            .handle_fn(Capabilities::READ, pattern!("a"), |_, _| {
                Ok(Reference::new(path!("x")).to_value())
            })
            .unwrap();

        let results = collect(store.read(&path!("a/b/c"))).await;
        assert_eq!(
            results,
            vec![
                PathValue::new(path!("a"), Reference::new(path!("x")).to_value()),
                PathValue::absent(path!("x/b/c")),
            ]
        );
    }

    #[tokio::test]
    async fn references_chain_through_handlers() {
        let store = PatternStore::new()
            .alias(pattern!("link"), "hop")
            .unwrap()
            .alias(pattern!("hop"), "target")
            .unwrap()
            .handle_fn(Capabilities::READ, pattern!("target/:leaf"), |context, _| {
                let leaf = context.capture("leaf").map(ToString::to_string);
                Ok(Value::from(leaf.unwrap_or_default()))
            })
            .unwrap();

        let results = collect(store.read(&path!("link/name"))).await;
        let paths: Vec<String> = results.iter().map(|pv| pv.path.to_string()).collect();
        assert_eq!(paths, vec!["link", "hop", "target/name"]);
        assert_eq!(results[2].value, Some(Value::from("name")));
    }

    #[tokio::test]
    async fn writes_and_deletes_do_not_follow_references() {
        let target_calls = Arc::new(AtomicUsize::new(0));
        let store = PatternStore::new()
            .handle_fn(Capabilities::WRITE | Capabilities::DELETE, pattern!("a"), |_, _| {
                Ok(Reference::new(path!("x")).to_value())
            })
            .unwrap()
            .handle_fn(Capabilities::ALL, pattern!("x"), counted(target_calls.clone(), "x"))
            .unwrap();

        let written = collect(store.write(PathValue::new(path!("a/b"), 1i64))).await;
        assert_eq!(written.len(), 1);
        let deleted = collect(store.delete(&path!("a/b"))).await;
        assert_eq!(deleted.len(), 1);
        assert_eq!(target_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn write_receives_the_value() {
        let backing = InMemoryStore::new();
        let sink = backing.clone();
        let store = PatternStore::new()
            .handle(ActionHandler::new(
                Capabilities::WRITE,
                pattern!("settings/:key"),
                move |context, input| {
                    sink.write(PathValue {
                        path: path!("stored").join(&context.path().tail(1)),
                        value: input,
                    })
                },
            ))
            .unwrap();

        let echoed = collect(store.write(PathValue::new(path!("settings/theme"), "dark"))).await;
        assert_eq!(echoed, vec![PathValue::new(path!("stored/theme"), "dark")]);
        assert_eq!(
            backing.snapshot().unwrap().get(&path!("stored/theme")),
            Some(&Value::from("dark"))
        );
    }

    #[tokio::test]
    async fn batch_results_follow_input_order() {
        let store = PatternStore::new()
            .handle(ActionHandler::new(Capabilities::READ, pattern!("q1"), |context, _| {
                stream::iter(vec![
                    PathValue::new(context.path().child("a"), "R1a"),
                    PathValue::new(context.path().child("b"), "R1b"),
                ])
            }))
            .unwrap()
            .handle_fn(Capabilities::READ, pattern!("q2"), tagged("R2a"))
            .unwrap();

        let results = collect(store.read_many(vec![path!("q1"), path!("q2")])).await;
        let values: Vec<Value> = results.into_iter().filter_map(|pv| pv.value).collect();
        assert_eq!(values, vec![Value::from("R1a"), Value::from("R1b"), Value::from("R2a")]);
    }

    #[tokio::test]
    async fn nothing_runs_until_polled_and_reruns_each_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = PatternStore::new()
            .handle_fn(Capabilities::READ, pattern!("a"), counted(calls.clone(), "a"))
            .unwrap();

        let first = store.read_many(vec![path!("a"), path!("a")]);
        let second = store.read(&path!("a"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        collect(first).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        collect(second).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn handler_failure_ends_the_batch() {
        let after_calls = Arc::new(AtomicUsize::new(0));
        let store = PatternStore::new()
            .handle_fn(Capabilities::READ, pattern!("ok"), tagged("fine"))
            .unwrap()
            .handle_fn(Capabilities::READ, pattern!("bad"), |context, _| {
                Err(Error::handler(context.path(), "backend down"))
            })
            .unwrap()
            .handle_fn(Capabilities::READ, pattern!("after"), counted(after_calls.clone(), "after"))
            .unwrap();

        let results =
            collect_all(store.read_many(vec![path!("ok"), path!("bad"), path!("after")])).await;
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert_eq!(results[1], Err(Error::handler(&path!("bad"), "backend down")));
        assert_eq!(after_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_reference_surfaces_as_error() {
        let store = PatternStore::new()
            .handle_fn(Capabilities::READ, pattern!("broken"), |_, _| {
                Ok(Value::from(serde_json::json!({"$ref": 7})))
            })
            .unwrap();

        let results = collect_all(store.read(&path!("broken/x"))).await;
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(Error::InvalidReference { .. })));
    }

    fn two_results(first: Value) -> ActionHandler {
        ActionHandler::new(Capabilities::ALL, pattern!("multi"), move |context, _| {
            stream::iter(vec![
                PathValue::new(context.path().child("a"), first.clone()),
                PathValue::new(context.path().child("b"), "after"),
            ])
        })
    }

    #[tokio::test]
    async fn malformed_reference_ends_the_read() {
        let store = PatternStore::new()
            .handle(two_results(Value::from(serde_json::json!({"$ref": 7}))))
            .unwrap();

        let results = collect_all(store.read(&path!("multi"))).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().map(|pv| pv.path.clone()), Ok(path!("multi/a")));
        assert!(matches!(results[1], Err(Error::InvalidReference { .. })));
    }

    #[tokio::test]
    async fn depth_limit_ends_the_read() {
        let store = PatternStore::new()
            .with_config(DispatchConfig::default().with_max_reference_depth(1))
            .handle(two_results(Reference::new(path!("loop")).to_value()))
            .unwrap()
            .alias(pattern!("loop"), "loop")
            .unwrap();

        let results = collect_all(store.read(&path!("multi"))).await;
        // multi/a, loop, then the error; multi/b is never reached
        assert_eq!(results.len(), 3);
        assert_eq!(
            results[2],
            Err(Error::ReferenceDepthExceeded {
                path: path!("loop"),
                limit: 1,
            })
        );
    }

    #[tokio::test]
    async fn handler_error_ends_a_single_write() {
        let store = PatternStore::new()
            .handle(ActionHandler::new(Capabilities::WRITE, pattern!("v"), |context, _| {
                stream::iter(vec![PathValue::absent(context.path().clone())])
                    .chain(stream::fail(Error::handler(context.path(), "first")))
                    .chain(stream::fail(Error::handler(context.path(), "second")))
                    .boxed()
            }))
            .unwrap();

        let results = collect_all(store.write(PathValue::new(path!("v"), 1i64))).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[1], Err(Error::handler(&path!("v"), "first")));
    }

    #[tokio::test]
    async fn reference_cycles_hit_the_depth_limit() {
        let store = PatternStore::new()
            .with_config(DispatchConfig::default().with_max_reference_depth(3))
            .alias(pattern!("ping"), "pong")
            .unwrap()
            .alias(pattern!("pong"), "ping")
            .unwrap();

        let results = collect_all(store.read(&path!("ping"))).await;
        // ping, pong, ping, pong, then the error
        assert_eq!(results.len(), 5);
        assert_eq!(
            results[4],
            Err(Error::ReferenceDepthExceeded {
                path: path!("ping"),
                limit: 3,
            })
        );
    }

    #[tokio::test]
    async fn unbounded_cycles_keep_producing() {
        let store = PatternStore::new()
            .with_config(DispatchConfig::unbounded())
            .alias(pattern!("loop"), "loop")
            .unwrap();

        // The consumer bounds the read by stopping early.
        let results: Vec<Result<PathValue, Error>> =
            store.read(&path!("loop")).take(100).collect().await;
        assert_eq!(results.len(), 100);
        assert!(results.iter().all(Result::is_ok));
    }

    #[tokio::test]
    async fn fallback_store_serves_unclaimed_paths() {
        let data = InMemoryStore::with_data(Value::from(serde_json::json!({
            "users": {"alice": {"name": "Alice"}}
        })));
        let store = PatternStore::new()
            .alias(pattern!("me"), "users/alice")
            .unwrap()
            .with_fallback(data.clone());

        let results = collect(store.read(&path!("me/name"))).await;
        assert_eq!(
            results[1],
            PathValue::new(path!("users/alice/name"), "Alice")
        );

        collect(store.write(PathValue::new(path!("users/bob/name"), "Bob"))).await;
        assert_eq!(
            data.snapshot().unwrap().get(&path!("users/bob/name")),
            Some(&Value::from("Bob"))
        );
    }

    #[tokio::test]
    async fn dropping_a_stream_cancels_pending_work() {
        let calls = Arc::new(AtomicUsize::new(0));
        let observed = calls.clone();
        let store = PatternStore::new()
            .handle(ActionHandler::future(Capabilities::READ, pattern!("slow"), move |context, _| {
                let calls = observed.clone();
                async move {
                    tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![PathValue::absent(context.path().clone())])
                }
            }))
            .unwrap();

        let mut pending = store.read(&path!("slow"));
        let polled =
            tokio::time::timeout(std::time::Duration::from_millis(10), pending.next()).await;
        assert!(polled.is_err());
        drop(pending);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn zero_length_patterns_cannot_be_built() {
        assert!(Pattern::parse("").is_err());
        assert!(Pattern::new(vec![]).is_err());
    }
}
