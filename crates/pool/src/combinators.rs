//! All combinators are pure constructors: they validate their inputs at
//! call time, allocate a derived [`StreamId`] carrying a lazy recipe, and
//! defer every subscription to discovery time. Discovering a derived id
//! resolves its source ids transitively; errors signalled by an upstream
//! stream pass through untouched.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::ready;
use futures::stream::{BoxStream, select_all};
use futures::{Stream, StreamExt};
use tokio::time::{Instant, sleep_until};

use crate::discovery::{Discovery, DiscoveryService, StreamFactory};
use crate::error::Error;
use crate::source::{AnySource, Source};
use crate::stream_id::StreamId;

/// Derives a stream emitting `map(x)` for every source element `x` for
/// which `map` returns a value.
///
/// Returning `None` drops the element silently; it is a deliberate
/// non-emission, not an error. Source order is preserved.
pub fn mapped_stream<T, R, F>(source: &StreamId<T>, map: F) -> StreamId<R>
where
    T: Clone + Debug + Send + Sync + 'static,
    R: Clone + Debug + Send + Sync + 'static,
    F: Fn(T) -> Option<R> + Send + Sync + 'static,
{
    StreamId::derived(
        "mapped",
        MappedFactory {
            source: source.clone(),
            map: Arc::new(map),
        },
    )
}

/// Derives a stream flattening the sub-stream `flat_map` returns for every
/// source element into one output stream.
///
/// Sub-streams may emit interleaved; the relative order of elements within
/// one sub-stream is preserved.
pub fn flat_mapped_stream<T, R, S, F>(source: &StreamId<T>, flat_map: F) -> StreamId<R>
where
    T: Clone + Debug + Send + Sync + 'static,
    R: Clone + Debug + Send + Sync + 'static,
    S: Stream<Item = R> + Send + 'static,
    F: Fn(T) -> S + Send + Sync + 'static,
{
    let flat_map: Arc<dyn Fn(T) -> BoxStream<'static, R> + Send + Sync> =
        Arc::new(move |element| flat_map(element).boxed());
    StreamId::derived(
        "flat-mapped",
        FlatMappedFactory {
            source: source.clone(),
            flat_map,
        },
    )
}

/// Derives a stream emitting every element of every source, in arrival
/// order across sources.
///
/// # Errors
/// `Error::InvalidArgument` if `sources` is empty. The check runs here, at
/// construction time, before a derived id is allocated.
pub fn merged_stream<T>(sources: &[StreamId<T>]) -> Result<StreamId<T>, Error>
where
    T: Clone + Debug + Send + Sync + 'static,
{
    if sources.is_empty() {
        return Err(Error::InvalidArgument(
            "merged stream requires at least one source id",
        ));
    }
    Ok(StreamId::derived(
        "merged",
        MergedFactory {
            sources: sources.to_vec(),
        },
    ))
}

/// Derives a stream emitting the source elements satisfying `predicate`,
/// in source order.
pub fn filtered_stream<T, P>(source: &StreamId<T>, predicate: P) -> StreamId<T>
where
    T: Clone + Debug + Send + Sync + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    StreamId::derived(
        "filtered",
        FilteredFactory {
            source: source.clone(),
            predicate: Arc::new(predicate),
        },
    )
}

/// Derives a stream emitting every source element shifted later by `delay`.
///
/// Each element's deadline is stamped at arrival, so relative offsets
/// between elements survive the shift.
pub fn delayed_stream<T>(source: &StreamId<T>, delay: Duration) -> StreamId<T>
where
    T: Clone + Debug + Send + Sync + 'static,
{
    StreamId::derived(
        "delayed",
        DelayedFactory {
            source: source.clone(),
            delay,
        },
    )
}

/// Derives a stream pairing the n-th left element with the n-th right
/// element and emitting `zip(l, r)` where it returns a value.
///
/// Pairing ends when either source ends. Returning `None` drops the pair
/// without shortening the pairing.
pub fn zipped_stream<L, R, Z, F>(left: &StreamId<L>, right: &StreamId<R>, zip: F) -> StreamId<Z>
where
    L: Clone + Debug + Send + Sync + 'static,
    R: Clone + Debug + Send + Sync + 'static,
    Z: Clone + Debug + Send + Sync + 'static,
    F: Fn(L, R) -> Option<Z> + Send + Sync + 'static,
{
    StreamId::derived(
        "zipped",
        ZippedFactory {
            left: left.clone(),
            right: right.clone(),
            zip: Arc::new(zip),
        },
    )
}

struct MappedFactory<T, R> {
    source: StreamId<T>,
    map: Arc<dyn Fn(T) -> Option<R> + Send + Sync>,
}

#[async_trait]
impl<T, R> StreamFactory for MappedFactory<T, R>
where
    T: Clone + Debug + Send + Sync + 'static,
    R: Clone + Debug + Send + Sync + 'static,
{
    async fn materialize(&self, discovery: &dyn DiscoveryService) -> Result<AnySource, Error> {
        let upstream = discovery.discover(&self.source).await?;
        let map = Arc::clone(&self.map);
        let source = Source::from_factory(move || {
            let map = Arc::clone(&map);
            upstream
                .subscribe()
                .filter_map(move |element| ready(map(element)))
        });
        Ok(AnySource::new(source))
    }
}

struct FlatMappedFactory<T, R> {
    source: StreamId<T>,
    flat_map: Arc<dyn Fn(T) -> BoxStream<'static, R> + Send + Sync>,
}

#[async_trait]
impl<T, R> StreamFactory for FlatMappedFactory<T, R>
where
    T: Clone + Debug + Send + Sync + 'static,
    R: Clone + Debug + Send + Sync + 'static,
{
    async fn materialize(&self, discovery: &dyn DiscoveryService) -> Result<AnySource, Error> {
        let upstream = discovery.discover(&self.source).await?;
        let flat_map = Arc::clone(&self.flat_map);
        let source = Source::from_factory(move || {
            let flat_map = Arc::clone(&flat_map);
            upstream
                .subscribe()
                .map(move |element| flat_map(element))
                .flatten_unordered(None)
        });
        Ok(AnySource::new(source))
    }
}

struct MergedFactory<T> {
    sources: Vec<StreamId<T>>,
}

#[async_trait]
impl<T> StreamFactory for MergedFactory<T>
where
    T: Clone + Debug + Send + Sync + 'static,
{
    async fn materialize(&self, discovery: &dyn DiscoveryService) -> Result<AnySource, Error> {
        let mut upstreams = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            upstreams.push(discovery.discover(source).await?);
        }
        let source =
            Source::from_factory(move || select_all(upstreams.iter().map(Source::subscribe)));
        Ok(AnySource::new(source))
    }
}

struct FilteredFactory<T> {
    source: StreamId<T>,
    predicate: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

#[async_trait]
impl<T> StreamFactory for FilteredFactory<T>
where
    T: Clone + Debug + Send + Sync + 'static,
{
    async fn materialize(&self, discovery: &dyn DiscoveryService) -> Result<AnySource, Error> {
        let upstream = discovery.discover(&self.source).await?;
        let predicate = Arc::clone(&self.predicate);
        let source = Source::from_factory(move || {
            let predicate = Arc::clone(&predicate);
            upstream
                .subscribe()
                .filter(move |element| ready(predicate(element)))
        });
        Ok(AnySource::new(source))
    }
}

struct DelayedFactory<T> {
    source: StreamId<T>,
    delay: Duration,
}

#[async_trait]
impl<T> StreamFactory for DelayedFactory<T>
where
    T: Clone + Debug + Send + Sync + 'static,
{
    async fn materialize(&self, discovery: &dyn DiscoveryService) -> Result<AnySource, Error> {
        let upstream = discovery.discover(&self.source).await?;
        let delay = self.delay;
        let source = Source::from_factory(move || {
            upstream
                .subscribe()
                .map(move |element| (Instant::now() + delay, element))
                .then(|(deadline, element)| async move {
                    sleep_until(deadline).await;
                    element
                })
        });
        Ok(AnySource::new(source))
    }
}

struct ZippedFactory<L, R, Z> {
    left: StreamId<L>,
    right: StreamId<R>,
    zip: Arc<dyn Fn(L, R) -> Option<Z> + Send + Sync>,
}

#[async_trait]
impl<L, R, Z> StreamFactory for ZippedFactory<L, R, Z>
where
    L: Clone + Debug + Send + Sync + 'static,
    R: Clone + Debug + Send + Sync + 'static,
    Z: Clone + Debug + Send + Sync + 'static,
{
    async fn materialize(&self, discovery: &dyn DiscoveryService) -> Result<AnySource, Error> {
        let left = discovery.discover(&self.left).await?;
        let right = discovery.discover(&self.right).await?;
        let zip = Arc::clone(&self.zip);
        let source = Source::from_factory(move || {
            let zip = Arc::clone(&zip);
            left.subscribe()
                .zip(right.subscribe())
                .filter_map(move |(l, r)| ready(zip(l, r)))
        });
        Ok(AnySource::new(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_stream_rejects_an_empty_source_list() {
        let err = merged_stream::<i32>(&[]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn combinators_allocate_distinct_derived_ids() {
        let source = StreamId::<i32>::named("values");

        let first = mapped_stream(&source, Some);
        let second = mapped_stream(&source, Some);

        assert_ne!(first, second);
        assert!(first.is_derived());
        assert!(second.is_derived());
    }

    #[test]
    fn construction_needs_no_registration() {
        // The source id is never provided anywhere; building the whole
        // chain still succeeds because nothing resolves until discovery.
        let source = StreamId::<i32>::fresh();
        let filtered = filtered_stream(&source, |element| *element > 0);
        let delayed = delayed_stream(&filtered, Duration::from_millis(10));
        let merged = merged_stream(std::slice::from_ref(&delayed)).unwrap();

        assert!(merged.is_derived());
    }

    #[test]
    fn derived_ids_name_their_combinator() {
        let source = StreamId::<i32>::named("values");

        assert!(mapped_stream(&source, Some).to_string().starts_with("mapped:"));
        assert!(
            zipped_stream(&source, &source, |l, r| Some(l + r))
                .to_string()
                .starts_with("zipped:")
        );
    }
}
