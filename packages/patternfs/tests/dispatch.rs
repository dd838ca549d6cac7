//! End-to-end dispatch through a small service namespace:
//!
//! - `config/...` is one setting kept in a separate in-memory store
//! - `status/*` is computed
//! - `me` aliases `users/alice`, `latest` aliases `posts/2`
//! - everything else falls through to the data store

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::{StreamExt, TryStreamExt};
use patternfs::{
    path, pattern, ActionHandler, Capabilities, Deleter, DispatchConfig, Error, InMemoryStore,
    Operation, PathValue, PathValueStream, PatternStore, Reader, Reference, Value, Writer,
};
use serde_json::json;

fn init_logging() {
    env_logger::builder().is_test(true).try_init().ok();
}

fn data() -> InMemoryStore {
    InMemoryStore::with_data(Value::from(json!({
        "users": {
            "alice": {"name": "Alice", "posts": 2},
            "bob": {"name": "Bob", "posts": 0},
        },
        "posts": ["first", "second", "third"],
    })))
}

struct Service {
    store: PatternStore,
    data: InMemoryStore,
    settings: InMemoryStore,
    status_reads: Arc<AtomicUsize>,
}

fn service() -> Service {
    let data = data();
    let settings = InMemoryStore::new();
    let status_reads = Arc::new(AtomicUsize::new(0));

    let backing = settings.clone();
    let counter = status_reads.clone();
    let store = PatternStore::new()
        .handle(ActionHandler::new(
            Capabilities::ALL,
            pattern!("config"),
            move |context, input| {
                log::debug!("config handler for {}", context.path());
                match context.operation() {
                    Operation::Read => backing.read(&path!("value")),
                    Operation::Write => backing.write(PathValue {
                        path: path!("value"),
                        value: input,
                    }),
                    Operation::Delete => backing.delete(&path!("value")),
                }
            },
        ))
        .unwrap()
        .handle_fn(Capabilities::READ, pattern!("status/:probe"), move |context, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            let probe = context
                .capture("probe")
                .map(ToString::to_string)
                .unwrap_or_default();
            Ok(Value::from(format!("{} ok", probe)))
        })
        .unwrap()
        .alias(pattern!("me"), "users/alice")
        .unwrap()
        .alias(pattern!("latest"), "posts/2")
        .unwrap()
        .with_fallback(data.clone());

    Service {
        store,
        data,
        settings,
        status_reads,
    }
}

async fn collect(s: PathValueStream) -> Vec<PathValue> {
    s.try_collect().await.unwrap()
}

#[tokio::test]
async fn alias_reads_resolve_through_the_fallback() {
    init_logging();
    let service = service();

    let results = collect(service.store.read(&path!("me/name"))).await;
    assert_eq!(
        results,
        vec![
            PathValue::new(path!("me"), Reference::new(path!("users/alice")).to_value()),
            PathValue::new(path!("users/alice/name"), "Alice"),
        ]
    );

    let latest = collect(service.store.read(&path!("latest"))).await;
    assert_eq!(latest.last(), Some(&PathValue::new(path!("posts/2"), "third")));
}

#[tokio::test]
async fn longer_patterns_claim_when_nothing_shorter_does() {
    init_logging();
    let service = service();

    // `status` has no length-one handler, so the longer pattern gets it
    let status = collect(service.store.read(&path!("status/disk"))).await;
    assert_eq!(status, vec![PathValue::new(path!("status/disk"), "disk ok")]);

    // A deeper query under `status/disk` is still owned by the length-two handler
    let nested = collect(service.store.read(&path!("status/disk/free"))).await;
    assert_eq!(nested, vec![PathValue::new(path!("status/disk"), "disk ok")]);
    assert_eq!(service.status_reads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn batches_mix_handlers_aliases_and_fallback_in_order() {
    init_logging();
    let service = service();

    let results = collect(service.store.read_many(vec![
        path!("users/bob/name"),
        path!("me/posts"),
        path!("status/net"),
    ]))
    .await;

    let paths: Vec<String> = results.iter().map(|pv| pv.path.to_string()).collect();
    assert_eq!(
        paths,
        vec!["users/bob/name", "me", "users/alice/posts", "status/net"]
    );
    assert_eq!(results[2].value, Some(Value::Integer(2)));
}

#[tokio::test]
async fn writes_and_deletes_reach_their_owners() {
    init_logging();
    let service = service();

    let written = collect(service.store.write(PathValue::new(path!("config/theme"), "dark"))).await;
    assert_eq!(written, vec![PathValue::new(path!("value"), "dark")]);
    let read_back = collect(service.store.read(&path!("config"))).await;
    assert_eq!(read_back, vec![PathValue::new(path!("value"), "dark")]);

    assert_eq!(
        service.settings.snapshot().unwrap().get(&path!("value")),
        Some(&Value::from("dark"))
    );

    collect(service.store.write(PathValue::new(path!("users/carol/name"), "Carol"))).await;
    assert_eq!(
        service.data.snapshot().unwrap().get(&path!("users/carol/name")),
        Some(&Value::from("Carol"))
    );

    let removed = collect(service.store.delete(&path!("users/bob"))).await;
    assert_eq!(removed.len(), 1);
    assert_eq!(service.data.snapshot().unwrap().get(&path!("users/bob")), None);
}

#[tokio::test]
async fn aliases_ignore_writes() {
    init_logging();
    let service = service();

    // The alias is read-only, so the write goes to the data store verbatim.
    collect(service.store.write(PathValue::new(path!("me/name"), "Mallory"))).await;
    let snapshot = service.data.snapshot().unwrap();
    assert_eq!(snapshot.get(&path!("users/alice/name")), Some(&Value::from("Alice")));
    assert_eq!(snapshot.get(&path!("me/name")), Some(&Value::from("Mallory")));
}

#[tokio::test]
async fn placeholders_without_a_fallback() {
    init_logging();
    let store = PatternStore::new()
        .alias(pattern!("home"), "users/{alice,bob}")
        .unwrap();

    let results = collect(store.read(&path!("home/[0..2]"))).await;
    let paths: Vec<String> = results.iter().map(|pv| pv.path.to_string()).collect();
    assert_eq!(
        paths,
        vec![
            "home",
            "users/alice/0",
            "users/alice/1",
            "users/bob/0",
            "users/bob/1",
        ]
    );
    assert!(results[1..].iter().all(PathValue::is_absent));
}

#[tokio::test]
async fn reference_cycles_are_cut_off() {
    init_logging();
    let store = PatternStore::new()
        .with_config(DispatchConfig::from_json(r#"{"max_reference_depth": 4}"#).unwrap())
        .alias(pattern!("a"), "b")
        .unwrap()
        .alias(pattern!("b"), "a")
        .unwrap();

    let results: Vec<Result<PathValue, Error>> = store.read(&path!("a/x")).collect().await;
    assert_eq!(results.len(), 6);
    assert!(results[..5].iter().all(Result::is_ok));
    assert!(matches!(
        results[5],
        Err(Error::ReferenceDepthExceeded { limit: 4, .. })
    ));
}

#[tokio::test]
async fn streams_are_lazy_and_replayable() {
    init_logging();
    let service = service();

    let pending = service.store.read(&path!("status/cpu"));
    assert_eq!(service.status_reads.load(Ordering::SeqCst), 0);
    drop(pending);
    assert_eq!(service.status_reads.load(Ordering::SeqCst), 0);

    let query = path!("status/cpu");
    for expected in 1..=2 {
        collect(service.store.read(&query)).await;
        assert_eq!(service.status_reads.load(Ordering::SeqCst), expected);
    }
}
