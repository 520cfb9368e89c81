use std::any::TypeId;
use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use uuid::Uuid;

use crate::discovery::StreamFactory;

/// Key under which a stream id is registered, compared and hashed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StreamKey {
    /// Explicitly named key; equal to every other key carrying the same name.
    Named(Arc<str>),
    /// Freshly generated key; equal only to its own clones.
    Unique(Uuid),
    /// Surrogate key of a combinator-built id.
    Derived {
        /// Name of the combinator that built the id.
        op: &'static str,
        /// Token distinguishing this derivation from any other.
        token: Uuid,
    },
}

impl Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::Unique(id) => write!(f, "{id}"),
            Self::Derived { op, token } => write!(f, "{op}:{token}"),
        }
    }
}

struct Inner {
    key: StreamKey,
    factory: Option<Arc<dyn StreamFactory>>,
}

/// Immutable, typed identity of a stream in the pool.
///
/// An id does not hold the stream itself; it is a token that discovery
/// resolves to a live [`Source`](crate::Source) on demand. Two ids compare
/// and hash equal iff their keys are equal, so a named id constructed twice
/// denotes the same registration slot. Ids built by combinators additionally
/// carry the recipe for materializing their stream lazily from their source
/// ids; the recipe never takes part in equality.
///
/// Cloning is a cheap reference-count bump and ids are freely shareable
/// across tasks and threads.
pub struct StreamId<T> {
    inner: Arc<Inner>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> StreamId<T> {
    /// Creates an id under an explicit name.
    ///
    /// All ids of the same element type created under one name denote the
    /// same registration slot.
    pub fn named<K>(name: K) -> Self
    where
        K: Into<String>,
    {
        Self::with_key(StreamKey::Named(name.into().into()), None)
    }

    /// Creates a fresh id, equal to nothing but its own clones.
    #[must_use]
    pub fn fresh() -> Self {
        Self::with_key(StreamKey::Unique(Uuid::new_v4()), None)
    }

    /// Creates a combinator-built id carrying a lazy stream recipe.
    pub(crate) fn derived<F>(op: &'static str, factory: F) -> Self
    where
        F: StreamFactory + 'static,
    {
        Self::with_key(
            StreamKey::Derived {
                op,
                token: Uuid::new_v4(),
            },
            Some(Arc::new(factory)),
        )
    }

    fn with_key(key: StreamKey, factory: Option<Arc<dyn StreamFactory>>) -> Self {
        Self {
            inner: Arc::new(Inner { key, factory }),
            _marker: PhantomData,
        }
    }

    /// Returns the key this id is registered and compared under.
    #[must_use]
    pub fn key(&self) -> &StreamKey {
        &self.inner.key
    }

    /// Whether this id was built by a combinator.
    #[must_use]
    pub fn is_derived(&self) -> bool {
        self.inner.factory.is_some()
    }

    /// Type-erased view of this id, used at the capability boundary.
    #[must_use]
    pub fn erase(&self) -> AnyStreamId
    where
        T: 'static,
    {
        AnyStreamId {
            key: self.inner.key.clone(),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            factory: self.inner.factory.clone(),
        }
    }
}

impl<T> Clone for StreamId<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for StreamId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.key == other.inner.key
    }
}

impl<T> Eq for StreamId<T> {}

impl<T> Hash for StreamId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.key.hash(state);
    }
}

impl<T> Debug for StreamId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamId")
            .field("key", &self.inner.key)
            .field("element", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> Display for StreamId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.inner.key, f)
    }
}

/// Type-erased view of a [`StreamId`].
///
/// Carries the key, the element type tag validated at resolution time, and
/// the lazy recipe of derived ids.
#[derive(Clone)]
pub struct AnyStreamId {
    key: StreamKey,
    type_id: TypeId,
    type_name: &'static str,
    factory: Option<Arc<dyn StreamFactory>>,
}

impl AnyStreamId {
    /// Returns the key this id is registered under.
    #[must_use]
    pub fn key(&self) -> &StreamKey {
        &self.key
    }

    /// Tag of the element type the id claims.
    #[must_use]
    pub fn element_type_id(&self) -> TypeId {
        self.type_id
    }

    /// Name of the element type the id claims.
    #[must_use]
    pub fn element_type_name(&self) -> &'static str {
        self.type_name
    }

    /// The lazy stream recipe, present on combinator-built ids.
    #[must_use]
    pub fn factory(&self) -> Option<&Arc<dyn StreamFactory>> {
        self.factory.as_ref()
    }
}

impl Debug for AnyStreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyStreamId")
            .field("key", &self.key)
            .field("element", &self.type_name)
            .finish()
    }
}

impl Display for AnyStreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.key, f)
    }
}
