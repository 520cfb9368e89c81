use std::any::{Any, TypeId};
use std::fmt::{self, Debug};
use std::sync::Arc;

use futures::future::ready;
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;

/// A live stream handle held by the pool and returned by discovery.
///
/// A `Source` is not itself an element stream; it is a recipe for one.
/// Every call to [`subscribe`](Self::subscribe) yields a fresh,
/// independently-consumable stream, so one registration fans out to any
/// number of consumers. Resolving or cloning a source never moves data;
/// elements flow only through subscribed streams.
pub struct Source<T> {
    factory: Arc<dyn Fn() -> BoxStream<'static, T> + Send + Sync>,
}

impl<T> Source<T>
where
    T: Clone + Debug + Send + Sync + 'static,
{
    /// Creates a source from a closure producing one stream per subscriber.
    pub fn from_factory<S, F>(factory: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: Stream<Item = T> + Send + 'static,
    {
        Self {
            factory: Arc::new(move || factory().boxed()),
        }
    }

    /// Creates a cold source replaying a fixed sequence to every subscriber.
    pub fn of<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let values: Vec<T> = values.into_iter().collect();
        Self::from_factory(move || stream::iter(values.clone()))
    }

    /// Creates a hot, broadcast-backed source together with its publisher.
    ///
    /// Subscribers receive elements published after they subscribed;
    /// elements published while nobody listens are dropped. Streams end
    /// once every [`Publisher`] clone is gone. Slow subscribers that fall
    /// more than `capacity` elements behind skip ahead.
    #[must_use]
    pub fn channel(capacity: usize) -> (Publisher<T>, Self) {
        let (sender, receiver) = broadcast::channel(capacity);
        let source = Self::from_factory(move || {
            BroadcastStream::new(receiver.resubscribe()).filter_map(|element| ready(element.ok()))
        });
        (Publisher { sender }, source)
    }

    /// Opens a fresh element stream over this source.
    #[must_use]
    pub fn subscribe(&self) -> BoxStream<'static, T> {
        (self.factory)()
    }
}

impl<T> Clone for Source<T> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<T> Debug for Source<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("element", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

/// Producer half of a [`Source::channel`] pair.
#[derive(Clone, Debug)]
pub struct Publisher<T> {
    sender: broadcast::Sender<T>,
}

impl<T> Publisher<T>
where
    T: Clone + Debug + Send + Sync + 'static,
{
    /// Publishes an element to every current subscriber.
    pub fn publish(&self, element: T) {
        debug!("publishing element: {:?}", element);
        let _ = self.sender.send(element);
    }
}

/// Type-erased registration slot stored by pools.
///
/// Wraps a [`Source`] together with its element type tag so a registry can
/// hold streams of arbitrary element types and still report a reuse of one
/// key across two types as a mismatch instead of miscasting.
#[derive(Clone)]
pub struct AnySource {
    source: Arc<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl AnySource {
    /// Erases the element type of `source`.
    pub fn new<T>(source: Source<T>) -> Self
    where
        T: Clone + Debug + Send + Sync + 'static,
    {
        Self {
            source: Arc::new(source),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Tag of the element type this slot holds.
    #[must_use]
    pub fn element_type_id(&self) -> TypeId {
        self.type_id
    }

    /// Name of the element type this slot holds.
    #[must_use]
    pub fn element_type_name(&self) -> &'static str {
        self.type_name
    }

    /// Recovers the typed handle, or `None` if the element type differs.
    #[must_use]
    pub fn downcast<T>(&self) -> Option<Source<T>>
    where
        T: Clone + Debug + Send + Sync + 'static,
    {
        self.source.downcast_ref::<Source<T>>().cloned()
    }
}

impl Debug for AnySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnySource")
            .field("element", &self.type_name)
            .finish_non_exhaustive()
    }
}
