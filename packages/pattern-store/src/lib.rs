//! Pattern-dispatching store for PatternFS.
//!
//! A [`PatternStore`] lets registered [`Handler`]s intercept reads, writes
//! and deletes on path shapes they declare, synthesizing or redirecting
//! values instead of looking them up:
//!
//! - [`Pattern`]: one [`Matcher`] per leading query segment
//! - [`Capabilities`]: which operations a handler accepts
//! - [`HandlerRegistry`]: handlers bucketed by pattern length
//! - [`PatternStore`]: shortest-prefix dispatch, fallback expansion and
//!   reference following for reads
//!
//! # Example
//!
//! ```rust
//! use futures::TryStreamExt;
//! use patternfs_core_store::{path, InMemoryStore, PathValue, Reader, Value};
//! use patternfs_pattern_store::{pattern, PatternStore};
//!
//! # futures::executor::block_on(async {
//! let data = InMemoryStore::with_data(Value::from(serde_json::json!({
//!     "users": {"alice": {"name": "Alice"}}
//! })));
//!
//! // `me/...` is a symbolic link to `users/alice/...`
//! let store = PatternStore::new()
//!     .alias(pattern!("me"), "users/alice")
//!     .unwrap()
//!     .with_fallback(data);
//!
//! let results: Vec<PathValue> = store.read(&path!("me/name")).try_collect().await.unwrap();
//! assert_eq!(results.last(), Some(&PathValue::new(path!("users/alice/name"), "Alice")));
//! # });
//! ```

mod capabilities;
mod config;
mod handler;
mod pattern;
mod pattern_store;
mod registry;

pub use capabilities::Capabilities;
pub use config::{DispatchConfig, DEFAULT_MAX_REFERENCE_DEPTH};
pub use handler::{Action, ActionHandler, AliasHandler, Handler, MatchContext};
pub use pattern::{Captures, Matcher, Pattern};
pub use pattern_store::PatternStore;
pub use registry::{Claim, HandlerRegistry};
