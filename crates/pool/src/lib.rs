//! Stream identity and combinator core for the streaming pool.
//!
//! Producers register live streams under typed [`StreamId`]s through the
//! providing capability; consumers resolve ids back to streams through the
//! discovery capability and build derived ids with the lazy combinators.
//! Nothing flows until a resolved [`Source`] is subscribed.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Combinators building derived stream ids out of existing ones.
pub mod combinators;

mod discovery;
mod error;
mod providing;
mod source;
mod stream_id;

pub use discovery::{Discovery, DiscoveryService, StreamFactory};
pub use error::Error;
pub use providing::{Providing, ProvidingService};
pub use source::{AnySource, Publisher, Source};
pub use stream_id::{AnyStreamId, StreamId, StreamKey};
