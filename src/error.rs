//! Dispatch error types.
//!
//! Only configuration mistakes are errors here. "No route matched" is
//! delegation to the caller's continuation, and "method not allowed" is a
//! 405 response; neither aborts dispatch.

use thiserror::Error;

/// Boxed error type accepted from handler factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Fatal configuration errors surfaced while dispatching a request.
///
/// These are not recovered locally: they abort the current request's
/// dispatch and propagate to the caller, which decides whether to turn
/// them into a `500` response.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A pattern route was registered with a malformed regular expression.
    ///
    /// Surfaced on the first dispatch that attempts to match the route,
    /// never silently swallowed.
    #[error("invalid route pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// The target string the route was registered with.
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A handler factory failed to produce an invocable handler.
    #[error("unresolvable handler: {source}")]
    UnresolvableHandler {
        #[source]
        source: BoxError,
    },
}
