//! Core traits: Reader, Writer, Deleter.

use std::fmt;
use std::sync::Arc;

use crate::stream::{self, PathValueStream};
use crate::{Path, PathValue};

/// The kind of operation being performed on a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Write,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Read => "read",
            Operation::Write => "write",
            Operation::Delete => "delete",
        })
    }
}

/// Read path-values for a query.
///
/// Implementations must be lazy: constructing the returned stream performs
/// no work until it is polled.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Box<dyn Reader>`.
pub trait Reader: Send + Sync {
    /// Read everything the query names.
    fn read(&self, query: &Path) -> PathValueStream;

    /// Read several queries, results in query order.
    ///
    /// The combined stream ends after the first error.
    fn read_many<I>(&self, queries: I) -> PathValueStream
    where
        I: IntoIterator<Item = Path>,
        Self: Sized,
    {
        stream::concat(queries.into_iter().map(|q| self.read(&q)).collect())
    }
}

/// Write a value to a path.
///
/// The returned stream typically echoes what was written.
pub trait Writer: Send + Sync {
    /// Write one path-value.
    fn write(&self, pv: PathValue) -> PathValueStream;

    /// Write several path-values, results in input order.
    ///
    /// The combined stream ends after the first error.
    fn write_many<I>(&self, pvs: I) -> PathValueStream
    where
        I: IntoIterator<Item = PathValue>,
        Self: Sized,
    {
        stream::concat(pvs.into_iter().map(|pv| self.write(pv)).collect())
    }
}

/// Delete what a query names.
///
/// The returned stream typically echoes what was removed.
pub trait Deleter: Send + Sync {
    /// Delete everything the query names.
    fn delete(&self, query: &Path) -> PathValueStream;

    /// Delete several queries, results in query order.
    ///
    /// The combined stream ends after the first error.
    fn delete_many<I>(&self, queries: I) -> PathValueStream
    where
        I: IntoIterator<Item = Path>,
        Self: Sized,
    {
        stream::concat(queries.into_iter().map(|q| self.delete(&q)).collect())
    }
}

/// Combined read/write/delete.
pub trait Store: Reader + Writer + Deleter {}
impl<T: Reader + Writer + Deleter> Store for T {}

/// A shared, type-erased store.
pub type StoreRef = Arc<dyn Store>;

// Blanket implementations for references, boxes and shared pointers

impl<T: Reader + ?Sized> Reader for &T {
    fn read(&self, query: &Path) -> PathValueStream {
        (**self).read(query)
    }
}

impl<T: Writer + ?Sized> Writer for &T {
    fn write(&self, pv: PathValue) -> PathValueStream {
        (**self).write(pv)
    }
}

impl<T: Deleter + ?Sized> Deleter for &T {
    fn delete(&self, query: &Path) -> PathValueStream {
        (**self).delete(query)
    }
}

impl<T: Reader + ?Sized> Reader for Box<T> {
    fn read(&self, query: &Path) -> PathValueStream {
        self.as_ref().read(query)
    }
}

impl<T: Writer + ?Sized> Writer for Box<T> {
    fn write(&self, pv: PathValue) -> PathValueStream {
        self.as_ref().write(pv)
    }
}

impl<T: Deleter + ?Sized> Deleter for Box<T> {
    fn delete(&self, query: &Path) -> PathValueStream {
        self.as_ref().delete(query)
    }
}

impl<T: Reader + ?Sized> Reader for Arc<T> {
    fn read(&self, query: &Path) -> PathValueStream {
        self.as_ref().read(query)
    }
}

impl<T: Writer + ?Sized> Writer for Arc<T> {
    fn write(&self, pv: PathValue) -> PathValueStream {
        self.as_ref().write(pv)
    }
}

impl<T: Deleter + ?Sized> Deleter for Arc<T> {
    fn delete(&self, query: &Path) -> PathValueStream {
        self.as_ref().delete(query)
    }
}
