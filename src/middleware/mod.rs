//! Middleware dispatch chain with explicit continuations.
//!
//! A chain is an ordered sequence of [`HandlerEntry`] values executed by the
//! [`Dispatcher`]. Each handler receives the request, the response built so
//! far, and a [`Next`] continuation cursor. Invoking the cursor proceeds to
//! the next handler; not invoking it short-circuits the rest of the chain,
//! including the caller-supplied fallthrough.
//!
//! ## Core types
//!
//! - [`HandlerEntry`]: one unit of a chain, either a ready handler, a lazy
//!   factory, or a nested sub-chain.
//! - [`Next`]: by-value cursor into the remaining chain; call
//!   [`Next::run`] to advance.
//! - [`Dispatcher`]: runs a chain against a request/response pair. It is
//!   re-entrant: the router uses a nested dispatch for each matched route.
//! - [`Middleware`]: trait for struct middleware; [`from_middleware`]
//!   adapts an implementation into a [`MiddlewareHandler`].
//! - [`LoggerMiddleware`]: built-in request/response logger.

use std::{future::Future, pin::Pin, sync::Arc};

use tokio::time::Instant;

use crate::error::{BoxError, DispatchError};
use crate::http::{Request, Response};

/// The outcome of dispatching a request through a chain.
///
/// `Err` carries fatal configuration errors only; "not handled" outcomes
/// travel through the response and the continuation instead.
pub type DispatchResult = Result<Response, DispatchError>;

/// Type-erased future returned by handlers and continuations.
pub type MiddlewareFuture = Pin<Box<dyn Future<Output = DispatchResult> + Send>>;

/// A type-erased, reference-counted handler function.
///
/// Every ready-to-run unit in a chain is stored as a `MiddlewareHandler`.
/// The [`Arc`] wrapper makes handlers cheap to clone, so a [`Next`] cursor
/// can be advanced without copying closures.
pub type MiddlewareHandler =
    Arc<dyn Fn(Request, Response, Next) -> MiddlewareFuture + Send + Sync + 'static>;

/// "The rest of the pipeline" as a callable.
///
/// Invoking a continuation yields the downstream response; declining to
/// invoke it stops the pipeline at the current handler.
pub type Continuation = Arc<dyn Fn(Request, Response) -> MiddlewareFuture + Send + Sync + 'static>;

/// A deferred handler constructor, resolved when the dispatch cursor
/// reaches its position. Resolution failures abort the dispatch with
/// [`DispatchError::UnresolvableHandler`].
pub type HandlerFactory =
    Arc<dyn Fn() -> Result<MiddlewareHandler, BoxError> + Send + Sync + 'static>;

/// One unit of a handler chain.
///
/// The three shapes a unit can take are spelled out as variants, and the
/// resolution step is explicit in [`Next::run`]; there is no runtime type
/// inspection.
#[derive(Clone)]
pub enum HandlerEntry {
    /// A handler ready to be invoked.
    Handler(MiddlewareHandler),
    /// A factory resolved to a handler at dispatch time, at most once per
    /// dispatch. The resolved instance is not cached across dispatches.
    Factory(HandlerFactory),
    /// A nested chain, executed in place before the rest of the outer chain.
    Chain(Vec<HandlerEntry>),
}

impl HandlerEntry {
    /// Wraps an async closure as a handler entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use relay::{HandlerEntry, Next, Request, Response};
    ///
    /// let entry = HandlerEntry::handler(|req: Request, resp: Response, next: Next| async move {
    ///     let resp = resp.with_header("X-Powered-By", "relay");
    ///     next.run(req, resp).await
    /// });
    /// ```
    pub fn handler<F, Fut>(f: F) -> Self
    where
        F: Fn(Request, Response, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DispatchResult> + Send + 'static,
    {
        Self::Handler(Arc::new(move |request, response, next| {
            Box::pin(f(request, response, next))
        }))
    }

    /// Wraps an async closure that never delegates downstream.
    ///
    /// Terminal handlers sit at the end of a chain and produce the response
    /// themselves; the continuation is dropped unused.
    pub fn terminal<F, Fut>(f: F) -> Self
    where
        F: Fn(Request, Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DispatchResult> + Send + 'static,
    {
        Self::handler(move |request, response, _next| f(request, response))
    }

    /// Wraps a handler factory.
    pub fn factory<F>(f: F) -> Self
    where
        F: Fn() -> Result<MiddlewareHandler, BoxError> + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(f))
    }

    /// Wraps an ordered list of entries as a nested sub-chain.
    pub fn chain(entries: Vec<HandlerEntry>) -> Self {
        Self::Chain(entries)
    }
}

impl From<MiddlewareHandler> for HandlerEntry {
    fn from(handler: MiddlewareHandler) -> Self {
        Self::Handler(handler)
    }
}

impl From<Vec<HandlerEntry>> for HandlerEntry {
    fn from(entries: Vec<HandlerEntry>) -> Self {
        Self::Chain(entries)
    }
}

/// A cursor into the remaining handler chain for a single dispatch.
///
/// `Next` is passed by value to each handler and consumed by
/// [`run`](Self::run), so a handler cannot invoke the same continuation
/// twice; the contract violation is unrepresentable rather than documented
/// away. When the cursor moves past the last entry, the caller-supplied
/// fallthrough continuation receives the request and response unchanged.
#[derive(Clone)]
pub struct Next {
    entries: Arc<[HandlerEntry]>,
    index: usize,
    fallthrough: Continuation,
}

impl Next {
    /// Creates a cursor positioned at the start of `entries`.
    pub fn new(entries: impl Into<Arc<[HandlerEntry]>>, fallthrough: Continuation) -> Self {
        Self {
            entries: entries.into(),
            index: 0,
            fallthrough,
        }
    }

    /// Resolves and invokes the entry at the cursor, or the fallthrough
    /// continuation when the chain is exhausted.
    ///
    /// The handler at the cursor receives a cursor advanced by one, so each
    /// position is resolved at most once per dispatch. Nested chains run
    /// in place: their own fallthrough resumes this cursor.
    pub fn run(mut self, request: Request, response: Response) -> MiddlewareFuture {
        let Some(entry) = self.entries.get(self.index).cloned() else {
            return (self.fallthrough)(request, response);
        };
        self.index += 1;

        match entry {
            HandlerEntry::Handler(handler) => handler(request, response, self),
            HandlerEntry::Factory(factory) => match factory() {
                Ok(handler) => handler(request, response, self),
                Err(source) => {
                    Box::pin(async move { Err(DispatchError::UnresolvableHandler { source }) })
                }
            },
            HandlerEntry::Chain(entries) => {
                let resume: Continuation =
                    Arc::new(move |request, response| self.clone().run(request, response));
                Next::new(entries, resume).run(request, response)
            }
        }
    }
}

/// Executes handler chains against request/response pairs.
///
/// The dispatcher is stateless; the same instance serves as the top-level
/// engine and as the per-route engine inside the router.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use relay::{Continuation, Dispatcher, HandlerEntry, Request, Response};
///
/// # async fn demo() -> Result<(), relay::DispatchError> {
/// let chain = vec![HandlerEntry::handler(|req, resp: Response, next: relay::Next| async move {
///     next.run(req, resp).await
/// })];
///
/// let fallthrough: Continuation = Arc::new(|_req, resp| Box::pin(async move { Ok(resp) }));
/// let response = Dispatcher::new()
///     .dispatch(chain, Request::new("GET", "/"), Response::default(), fallthrough)
///     .await?;
/// assert_eq!(response.status(), relay::StatusCode::Ok);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Dispatcher;

impl Dispatcher {
    /// Creates a dispatcher.
    pub fn new() -> Self {
        Self
    }

    /// Runs `chain` in order against the request/response pair.
    ///
    /// Dispatching an empty chain invokes `fallthrough` directly with the
    /// original request and response. Construction is O(n) in chain length
    /// and recursion never exceeds the chain depth.
    pub fn dispatch(
        &self,
        chain: impl Into<Arc<[HandlerEntry]>>,
        request: Request,
        response: Response,
        fallthrough: Continuation,
    ) -> MiddlewareFuture {
        Next::new(chain, fallthrough).run(request, response)
    }
}

/// The trait for struct middleware.
///
/// Implementors receive the request, the response built so far, and a
/// [`Next`] cursor. They may pass through, short-circuit by returning a
/// response without running the cursor, or decorate the downstream result.
///
/// Implementations must be `Send + Sync`: the same instance is shared
/// across concurrently processed requests.
pub trait Middleware: Send + Sync {
    /// Handles the request, optionally delegating to the rest of the chain.
    fn handle(&self, request: Request, response: Response, next: Next) -> MiddlewareFuture;
}

/// Adapts a [`Middleware`] implementation into a [`MiddlewareHandler`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use relay::{HandlerEntry, LoggerMiddleware, from_middleware};
///
/// let entry = HandlerEntry::from(from_middleware(Arc::new(LoggerMiddleware)));
/// ```
pub fn from_middleware<M>(middleware: Arc<M>) -> MiddlewareHandler
where
    M: Middleware + 'static,
{
    Arc::new(move |request, response, next| middleware.handle(request, response, next))
}

/// Built-in middleware that logs each request's method, target, response
/// status, and elapsed time at `info` level once the downstream handlers
/// complete. Always passes through.
pub struct LoggerMiddleware;

impl Middleware for LoggerMiddleware {
    fn handle(&self, request: Request, response: Response, next: Next) -> MiddlewareFuture {
        Box::pin(async move {
            let start = Instant::now();
            let method = request.method().to_string();
            let target = request.target().to_string();

            let response = next.run(request, response).await?;

            tracing::info!(
                "{} {} - {} ({:?})",
                method,
                target,
                response.status().as_u16(),
                start.elapsed()
            );

            Ok(response)
        })
    }
}
