use thiserror::Error;

/// Errors that can occur in this crate.
///
/// All variants are raised synchronously from discovery, providing or
/// combinator construction, never deferred into a stream.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// A required argument failed eager validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The id has neither a registration nor a derivation to resolve.
    #[error("no stream registered for {0}")]
    NotFound(String),

    /// A registration slot holds a different element type than the id claims.
    ///
    /// Reusing one key for two element types is a programming error; this
    /// variant surfaces it at resolution time instead of miscasting.
    #[error("stream for {id} has element type `{actual}`, expected `{expected}`")]
    ElementTypeMismatch {
        /// Rendering of the offending id.
        id: String,
        /// Element type the id claims.
        expected: &'static str,
        /// Element type the registered slot holds.
        actual: &'static str,
    },
}
