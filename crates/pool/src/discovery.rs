use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::Error;
use crate::source::{AnySource, Source};
use crate::stream_id::{AnyStreamId, StreamId};

/// Lazy recipe carried by combinator-built ids.
///
/// Materialization resolves the recipe's source ids through the discovery
/// capability it is handed, so a chain of derived ids resolves transitively
/// at discovery time, not at construction time. Materializing must not
/// subscribe to anything; it only assembles the derived [`Source`].
#[async_trait]
pub trait StreamFactory: Send + Sync {
    /// Builds the derived stream slot by resolving sources through `discovery`.
    ///
    /// # Errors
    /// Fails with the discovery error of whichever source id does not resolve.
    async fn materialize(&self, discovery: &dyn DiscoveryService) -> Result<AnySource, Error>;
}

/// Capability to resolve erased stream ids, implemented by pools.
///
/// Resolution is a lookup plus, for derived ids, a first-time
/// materialization; it never blocks waiting for elements. Absence is a hard
/// error, never an absent slot.
#[async_trait]
pub trait DiscoveryService: Send + Sync {
    /// Resolves `id` to its registered or lazily materialized slot.
    ///
    /// # Errors
    /// `Error::NotFound` if `id` has neither a registration nor a recipe;
    /// `Error::ElementTypeMismatch` if the slot holds another element type.
    async fn discover_any(&self, id: &AnyStreamId) -> Result<AnySource, Error>;
}

/// Typed discovery surface, available on every [`DiscoveryService`].
#[async_trait]
pub trait Discovery: DiscoveryService {
    /// Resolves `id` to the live stream of `T` currently registered for it.
    ///
    /// # Errors
    /// `Error::NotFound` for an id that was never provided and is not
    /// derived; `Error::ElementTypeMismatch` if the registration slot holds
    /// a different element type than the id claims.
    async fn discover<T>(&self, id: &StreamId<T>) -> Result<Source<T>, Error>
    where
        T: Clone + Debug + Send + Sync + 'static,
    {
        let slot = self.discover_any(&id.erase()).await?;
        let actual = slot.element_type_name();
        slot.downcast::<T>().ok_or_else(|| Error::ElementTypeMismatch {
            id: id.to_string(),
            expected: std::any::type_name::<T>(),
            actual,
        })
    }
}

#[async_trait]
impl<D> Discovery for D where D: DiscoveryService + ?Sized {}
