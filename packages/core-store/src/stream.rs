//! Lazy result streams.
//!
//! Every store operation returns a [`PathValueStream`]. Building one never
//! does any work; the work happens when the stream is first polled, and
//! dropping the stream drops whatever was in flight.

use std::future::Future;

use futures::future;
use futures::stream::{self, BoxStream, StreamExt};

use crate::{Error, PathValue};

/// The result sequence of a read, write or delete.
pub type PathValueStream = BoxStream<'static, Result<PathValue, Error>>;

/// A stream with no items.
pub fn empty() -> PathValueStream {
    stream::empty().boxed()
}

/// A stream yielding a single item.
pub fn once(item: Result<PathValue, Error>) -> PathValueStream {
    stream::once(future::ready(item)).boxed()
}

/// A stream yielding a single error.
pub fn fail(error: Error) -> PathValueStream {
    once(Err(error))
}

/// A stream over already-computed path-values.
pub fn iter(items: Vec<PathValue>) -> PathValueStream {
    stream::iter(items.into_iter().map(Ok)).boxed()
}

/// Build the real stream only when first polled.
pub fn defer<F>(build: F) -> PathValueStream
where
    F: FnOnce() -> PathValueStream + Send + 'static,
{
    stream::once(future::lazy(move |_| build()))
        .flatten()
        .boxed()
}

/// Run a synchronous computation when first polled and stream its results.
pub fn deferred<F>(compute: F) -> PathValueStream
where
    F: FnOnce() -> Result<Vec<PathValue>, Error> + Send + 'static,
{
    defer(move || match compute() {
        Ok(items) => iter(items),
        Err(e) => fail(e),
    })
}

/// Await a future when first polled and stream its results.
pub fn from_future<Fut>(fut: Fut) -> PathValueStream
where
    Fut: Future<Output = Result<Vec<PathValue>, Error>> + Send + 'static,
{
    stream::once(fut)
        .map(|result| match result {
            Ok(items) => iter(items),
            Err(e) => fail(e),
        })
        .flatten()
        .boxed()
}

/// Concatenate streams in order, stopping after the first error.
///
/// Each input is drained completely before the next one is polled.
pub fn concat(streams: Vec<PathValueStream>) -> PathValueStream {
    stop_after_error(stream::iter(streams).flatten().boxed())
}

/// End a stream right after it yields its first error.
pub fn stop_after_error(inner: PathValueStream) -> PathValueStream {
    inner
        .scan(false, |failed, item| {
            if *failed {
                return future::ready(None);
            }
            *failed = item.is_err();
            future::ready(Some(item))
        })
        .boxed()
}
