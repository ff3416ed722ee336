//! # relay
//!
//! Continuation-based HTTP request routing and middleware dispatch.
//!
//! relay is the request-handling core of a web service, not the transport:
//! it decides which handlers run for a given method and path, and executes
//! them as an ordered chain where each handler may pass the request on,
//! decorate the downstream response, or short-circuit. Requests and
//! responses are immutable values, so a built pipeline can be shared
//! across threads without locks.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use relay::{from_middleware, HandlerEntry, Request, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), relay::DispatchError> {
//!     let mut router = Router::new();
//!     router.register(
//!         "GET",
//!         "/cats/{id}",
//!         HandlerEntry::terminal(|req: Request, resp: Response| async move {
//!             let id = req.attribute("id").unwrap_or("unknown").to_owned();
//!             Ok(resp.with_body(id))
//!         }),
//!     );
//!
//!     let server = Server::new()
//!         .add(from_middleware(Arc::new(relay::LoggerMiddleware)))
//!         .add(from_middleware(Arc::new(router)));
//!
//!     let response = server.respond(Request::new("GET", "/cats/42")).await?;
//!     println!("{}", response.status());
//!     Ok(())
//! }
//! ```
//!
//! ## Route targets
//!
//! | Target               | Matches                                          |
//! |----------------------|--------------------------------------------------|
//! | `/cats`              | exactly `/cats`                                  |
//! | `/cats/*`            | `/cats/` and anything below it                   |
//! | `/cats/{id}`         | one non-`/` segment, captured as attribute `id`  |
//! | `~^/cats/[0-9]+$~`   | a delimited regular expression, as written       |
//!
//! Static targets always win over prefix targets, and prefix targets over
//! patterns, no matter the registration order. The router never produces a
//! `404` itself; unmatched requests flow to its continuation, and
//! [`Server::respond`] supplies the not-found terminal.

pub mod error;
pub mod http;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::{BoxError, DispatchError};
pub use http::{Headers, Method, Request, Response, StatusCode};
pub use middleware::{
    Continuation, DispatchResult, Dispatcher, HandlerEntry, HandlerFactory, LoggerMiddleware,
    Middleware, MiddlewareFuture, MiddlewareHandler, Next, from_middleware,
};
pub use router::{MatchKind, MethodMap, PathVariables, Route, Router};
pub use server::Server;
