//! Top-level handler stack.
//!
//! [`Server`] owns the ordered stack of handlers every request passes
//! through. It is the layer that owns "not found" policy: the router inside
//! the stack only delegates when nothing matches, and the terminal
//! continuation supplied by [`Server::respond`] turns that delegation into
//! a `404`.
//!
//! Transport is out of scope. Feed requests in with [`Server::respond`]
//! from whatever I/O layer the application uses.

use std::sync::Arc;

use crate::error::DispatchError;
use crate::http::{Request, Response, StatusCode};
use crate::middleware::{Continuation, Dispatcher, HandlerEntry, MiddlewareFuture};

/// The top-level middleware stack.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use relay::{from_middleware, HandlerEntry, Request, Response, Router, Server, StatusCode};
///
/// # async fn demo() -> Result<(), relay::DispatchError> {
/// let mut router = Router::new();
/// router.register(
///     "GET",
///     "/ping",
///     HandlerEntry::terminal(|_req, resp: Response| async move { Ok(resp.with_body("pong")) }),
/// );
///
/// let server = Server::new().add(from_middleware(Arc::new(router)));
///
/// let response = server.respond(Request::new("GET", "/ping")).await?;
/// assert_eq!(response.status(), StatusCode::Ok);
///
/// let response = server.respond(Request::new("GET", "/missing")).await?;
/// assert_eq!(response.status(), StatusCode::NotFound);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct Server {
    stack: Vec<HandlerEntry>,
    dispatcher: Dispatcher,
}

impl Server {
    /// Creates a server with an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler to the end of the stack.
    #[must_use]
    pub fn add(mut self, entry: impl Into<HandlerEntry>) -> Self {
        self.stack.push(entry.into());
        self
    }

    /// Runs the stack against the request/response pair, with `next` as the
    /// final fallthrough.
    pub fn dispatch(
        &self,
        request: Request,
        response: Response,
        next: Continuation,
    ) -> MiddlewareFuture {
        self.dispatcher
            .dispatch(self.stack.clone(), request, response, next)
    }

    /// Responds to one request.
    ///
    /// Starts from an empty `200 OK` response and runs the stack with a
    /// terminal continuation that marks anything left unhandled as
    /// `404 Not Found`.
    pub async fn respond(&self, request: Request) -> Result<Response, DispatchError> {
        let not_found: Continuation = Arc::new(|_request, response: Response| {
            Box::pin(async move { Ok(response.with_status(StatusCode::NotFound)) })
        });
        self.dispatch(request, Response::default(), not_found).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{Next, from_middleware};
    use crate::router::Router;

    #[tokio::test]
    async fn unhandled_requests_get_404() {
        let server = Server::new();
        let response = server.respond(Request::new("GET", "/cats")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NotFound);
    }

    #[tokio::test]
    async fn handled_requests_keep_the_handler_response() {
        let server = Server::new().add(HandlerEntry::terminal(
            |_request, response: Response| async move {
                Ok(response.with_status(StatusCode::Created).with_body("made"))
            },
        ));

        let response = server.respond(Request::new("POST", "/cats")).await.unwrap();
        assert_eq!(response.status(), StatusCode::Created);
        assert_eq!(response.body().as_ref(), b"made");
    }

    #[tokio::test]
    async fn stack_runs_in_add_order_around_the_router() {
        let mut router = Router::new();
        router.register(
            "GET",
            "/cats/{id}",
            HandlerEntry::terminal(|request: Request, response: Response| async move {
                let id = request.attribute("id").unwrap_or("").to_owned();
                Ok(response.with_body(id))
            }),
        );

        let server = Server::new()
            .add(HandlerEntry::handler(|request, response, next: Next| async move {
                let response = next.run(request, response).await?;
                Ok(response.with_header("X-Outer", "seen"))
            }))
            .add(from_middleware(Arc::new(router)));

        let response = server.respond(Request::new("GET", "/cats/42")).await.unwrap();
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.body().as_ref(), b"42");
        assert_eq!(response.headers().get("X-Outer"), Some("seen"));
    }

    #[tokio::test]
    async fn router_misses_reach_the_not_found_terminal() {
        let mut router = Router::new();
        router.register(
            "GET",
            "/cats",
            HandlerEntry::terminal(|_request, response: Response| async move { Ok(response) }),
        );

        let server = Server::new().add(from_middleware(Arc::new(router)));
        let response = server.respond(Request::new("GET", "/dogs")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NotFound);
    }

    #[tokio::test]
    async fn configuration_errors_propagate_out_of_respond() {
        let server = Server::new().add(HandlerEntry::factory(|| Err("broken wiring".into())));
        let result = server.respond(Request::new("GET", "/cats")).await;
        assert!(matches!(
            result,
            Err(DispatchError::UnresolvableHandler { .. })
        ));
    }
}
