//! PatternFS: serve a path namespace with handlers chosen by path pattern.
//!
//! Handlers register a fixed-length pattern and the operations they accept.
//! Every read, write or delete is routed to the handler owning the shortest
//! matching prefix of its path; reads then follow any references the handler
//! produced. Paths nobody claims come back as path-only placeholders, or are
//! passed to a fallback store.
//!
//! This crate re-exports the two layers:
//!
//! - [`core_store`]: paths, values, the lazy store contract, an in-memory store
//! - [`pattern_store`]: patterns, handlers, and the dispatching [`PatternStore`]
//!
//! # Example
//!
//! ```rust
//! use futures::TryStreamExt;
//! use patternfs::{path, pattern, Capabilities, PathValue, PatternStore, Reader, Value};
//!
//! # futures::executor::block_on(async {
//! let store = PatternStore::new()
//!     .handle_fn(Capabilities::READ, pattern!("users/:id/greeting"), |context, _| {
//!         let id = context.capture("id").map(ToString::to_string).unwrap_or_default();
//!         Ok(Value::from(format!("hello, {}", id)))
//!     })
//!     .unwrap();
//!
//! let results: Vec<PathValue> = store
//!     .read_many(vec![path!("users/ada/greeting"), path!("users/grace/greeting")])
//!     .try_collect()
//!     .await
//!     .unwrap();
//! assert_eq!(results[1], PathValue::new(path!("users/grace/greeting"), "hello, grace"));
//! # });
//! ```

pub use patternfs_core_store as core_store;
pub use patternfs_pattern_store as pattern_store;

pub use patternfs_core_store::{
    expand, path, Deleter, Error, InMemoryStore, Operation, Path, PathValue, PathValueStream,
    Reader, Reference, Segment, Store, StoreRef, Value, Writer, REF_KEY,
};
pub use patternfs_pattern_store::{
    pattern, ActionHandler, AliasHandler, Capabilities, DispatchConfig, Handler, MatchContext,
    Pattern, PatternStore,
};
