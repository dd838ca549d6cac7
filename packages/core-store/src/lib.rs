//! Core PatternFS: the shared vocabulary of every store.
//!
//! - `Path`: an ordered sequence of `Segment`s, doubling as a query
//! - `Value`: the tree-shaped data that paths address
//! - `PathValue`: a path paired with what was found there
//! - `Reference`: a value that redirects to another path
//! - `Reader` / `Writer` / `Deleter`: the lazy store contract
//!
//! Every operation returns a [`PathValueStream`]; nothing happens until it
//! is polled.
//!
//! # Example
//!
//! ```rust
//! use futures::TryStreamExt;
//! use patternfs_core_store::{path, Error, PathValue, Reader};
//!
//! async fn read_user(store: &dyn Reader) -> Result<Vec<PathValue>, Error> {
//!     store.read(&path!("users/123")).try_collect().await
//! }
//! ```

mod error;
mod expand;
mod in_memory;
mod json;
mod path;
mod path_value;
mod reference;
pub mod stream;
mod traits;
mod value;

pub use error::Error;
pub use expand::expand;
pub use in_memory::InMemoryStore;
pub use path::{Path, PathError, Segment};
pub use path_value::PathValue;
pub use reference::{Reference, REF_KEY};
pub use stream::PathValueStream;
pub use traits::{Deleter, Operation, Reader, Store, StoreRef, Writer};
pub use value::Value;
