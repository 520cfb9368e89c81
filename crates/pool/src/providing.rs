use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::Error;
use crate::source::{AnySource, Source};
use crate::stream_id::{AnyStreamId, StreamId};

/// Capability to register erased stream slots, implemented by pools.
#[async_trait]
pub trait ProvidingService: Send + Sync {
    /// Publishes `source` under `id` so subsequent discoveries succeed.
    ///
    /// A completed registration is visible to every later discovery.
    /// Registering under an already-taken key replaces the slot for future
    /// discoveries; consumers holding the previous handle are unaffected.
    ///
    /// # Errors
    /// Implementation-specific registration failures.
    async fn provide_any(&self, id: &AnyStreamId, source: AnySource) -> Result<(), Error>;
}

/// Typed providing surface, available on every [`ProvidingService`].
#[async_trait]
pub trait Providing: ProvidingService {
    /// Registers `source` under a fresh id and returns the id.
    ///
    /// # Errors
    /// Implementation-specific registration failures.
    async fn provide<T>(&self, source: Source<T>) -> Result<StreamId<T>, Error>
    where
        T: Clone + Debug + Send + Sync + 'static,
    {
        let id = StreamId::fresh();
        self.provide_as(&id, source).await?;
        Ok(id)
    }

    /// Registers `source` under an explicit id.
    ///
    /// # Errors
    /// `Error::InvalidArgument` for a derived id: a derived id's stream is
    /// defined by its recipe and cannot be rebound.
    async fn provide_as<T>(&self, id: &StreamId<T>, source: Source<T>) -> Result<(), Error>
    where
        T: Clone + Debug + Send + Sync + 'static,
    {
        if id.is_derived() {
            return Err(Error::InvalidArgument(
                "cannot provide a stream under a derived id",
            ));
        }
        self.provide_any(&id.erase(), AnySource::new(source)).await
    }
}

#[async_trait]
impl<P> Providing for P where P: ProvidingService + ?Sized {}
