//! In-memory implementation of the stream pool capabilities.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use streampool::{AnySource, AnyStreamId, DiscoveryService, Error, ProvidingService, StreamKey};
use tracing::debug;

/// Type alias for the registry map
type SlotMap = Arc<DashMap<StreamKey, AnySource>>;

/// Process-local stream registry implementing both pool capabilities.
///
/// The pool is an explicit, constructor-injected object; create one per
/// scope that needs an isolated registry and share it by cloning. Its map
/// is sharded, so discoveries do not block on unrelated registrations, and
/// a completed registration is visible to every subsequent discovery.
///
/// Registration is last-writer-wins: providing under an already-taken key
/// replaces the slot for future discoveries, while consumers holding the
/// previously discovered handle keep it.
#[derive(Clone, Debug, Default)]
pub struct MemoryPool {
    slots: SlotMap,
}

impl MemoryPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Arc::new(DashMap::new()),
        }
    }

    /// Drops every registration, including cached derived slots.
    pub fn clear(&self) {
        debug!("clearing {} registrations", self.slots.len());
        self.slots.clear();
    }

    /// Number of registered slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the pool holds no registrations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

fn typed_slot(id: &AnyStreamId, slot: &AnySource) -> Result<AnySource, Error> {
    if slot.element_type_id() == id.element_type_id() {
        Ok(slot.clone())
    } else {
        Err(Error::ElementTypeMismatch {
            id: id.to_string(),
            expected: id.element_type_name(),
            actual: slot.element_type_name(),
        })
    }
}

#[async_trait]
impl DiscoveryService for MemoryPool {
    async fn discover_any(&self, id: &AnyStreamId) -> Result<AnySource, Error> {
        if let Some(slot) = self.slots.get(id.key()) {
            return typed_slot(id, slot.value());
        }

        let Some(factory) = id.factory() else {
            return Err(Error::NotFound(id.to_string()));
        };

        // First discovery of a derived id: materialize outside the map so
        // no shard lock is held across the await, then cache. If two
        // discoveries race, the first insertion wins and the losing
        // materialization (side-effect free until subscription) is dropped.
        debug!("materializing derived stream for {}", id);
        let created = factory.materialize(self).await?;
        let slot = self
            .slots
            .entry(id.key().clone())
            .or_insert(created)
            .value()
            .clone();
        typed_slot(id, &slot)
    }
}

#[async_trait]
impl ProvidingService for MemoryPool {
    async fn provide_any(&self, id: &AnyStreamId, source: AnySource) -> Result<(), Error> {
        debug!("registering stream for {}", id);
        self.slots.insert(id.key().clone(), source);
        Ok(())
    }
}
