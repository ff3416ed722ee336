//! Request routing: map target specifiers and HTTP methods to handler
//! chains.
//!
//! [`Router`] keeps three buckets of routes tried in a fixed precedence
//! order regardless of registration order across buckets: static targets
//! first, then prefix targets, then pattern targets. Within the prefix and
//! pattern buckets, routes are scanned in registration order and the first
//! match wins; registration order, not prefix length, is the tie-break.
//!
//! A router never decides 404 policy. When nothing matches, it hands the
//! request to the caller-supplied continuation, so routers compose: one can
//! be a plain handler inside another chain, including another router's.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::DispatchError;
use crate::http::{Method, Request, Response, StatusCode};
use crate::middleware::{
    Continuation, Dispatcher, HandlerEntry, Middleware, MiddlewareFuture, Next,
};

pub mod route;

pub use route::{MatchKind, MethodMap, PathVariables, Route};

/// An ordered table of routes with a dispatch algorithm.
///
/// Built once, then shared read-only across requests; matching itself never
/// mutates the router or its routes.
///
/// # Examples
///
/// ```
/// use relay::{HandlerEntry, Request, Response, Router};
///
/// let mut router = Router::new();
/// router.register(
///     "GET",
///     "/cats/{id}",
///     HandlerEntry::terminal(|req: Request, resp: Response| async move {
///         let id = req.attribute("id").unwrap_or("unknown").to_owned();
///         Ok(resp.with_body(id))
///     }),
/// );
/// ```
#[derive(Default)]
pub struct Router {
    statics: HashMap<String, Route>,
    prefixes: Vec<Route>,
    patterns: Vec<Route>,
    dispatcher: Dispatcher,
}

impl Router {
    /// Creates an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of distinct routes registered.
    pub fn len(&self) -> usize {
        self.statics.len() + self.prefixes.len() + self.patterns.len()
    }

    /// Returns `true` if no routes have been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registers `entry` for the given methods and target.
    ///
    /// `method_list` names one or more comma-separated HTTP methods
    /// (`"GET"`, `"GET,PUT"`); the wildcard name `"*"` serves any method
    /// not otherwise listed for the target. Method names are
    /// case-sensitive.
    ///
    /// Registering against a target that already has a route of the same
    /// classification merges into its method map instead of adding a second
    /// route, so several methods can share one target registration.
    pub fn register(
        &mut self,
        method_list: &str,
        target: &str,
        entry: impl Into<HandlerEntry>,
    ) -> &mut Self {
        let entry = entry.into();
        let route = self.route_for(target);
        for name in method_list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if name == "*" {
                route.methods_mut().set_wildcard(entry.clone());
            } else {
                route.methods_mut().insert(Method::from(name), entry.clone());
            }
        }
        self
    }

    // Finds the route registered for `target`, creating it in the bucket
    // its classification selects if it does not exist yet.
    fn route_for(&mut self, target: &str) -> &mut Route {
        match MatchKind::of(target) {
            MatchKind::Static => self
                .statics
                .entry(target.to_owned())
                .or_insert_with(|| Route::new(target)),
            MatchKind::Prefix => Self::list_route(&mut self.prefixes, target),
            MatchKind::Pattern => Self::list_route(&mut self.patterns, target),
        }
    }

    fn list_route<'a>(routes: &'a mut Vec<Route>, target: &str) -> &'a mut Route {
        let index = match routes.iter().position(|r| r.target() == target) {
            Some(index) => index,
            None => {
                routes.push(Route::new(target));
                routes.len() - 1
            }
        };
        &mut routes[index]
    }

    // Scans the buckets in precedence order for the first route matching
    // `path`, returning it with the captured variables.
    fn find(&self, path: &str) -> Result<Option<(&Route, PathVariables)>, DispatchError> {
        if let Some(route) = self.statics.get(path) {
            return Ok(Some((route, PathVariables::new())));
        }
        for route in self.prefixes.iter().chain(self.patterns.iter()) {
            if let Some(variables) = route.matches(path)? {
                return Ok(Some((route, variables)));
            }
        }
        Ok(None)
    }

    /// Routes one request.
    ///
    /// The query-string portion of the request target is ignored for
    /// matching. On a match, captured path variables are merged into the
    /// request's attribute map and the method's handler chain runs through
    /// the dispatcher, with `next` as its eventual fallthrough. When the
    /// matched route has no entry for the request's method (nor a wildcard),
    /// the result is the current response with status `405` and an `Allow`
    /// header naming the permitted methods. When no route matches at all,
    /// `next` receives the request and response unchanged.
    pub fn dispatch(
        &self,
        request: Request,
        response: Response,
        next: Continuation,
    ) -> MiddlewareFuture {
        let found = match self.find(request.path()) {
            Ok(found) => found,
            Err(err) => return Box::pin(async move { Err(err) }),
        };

        let Some((route, variables)) = found else {
            tracing::debug!(path = request.path(), "no route matched, delegating");
            return next(request, response);
        };

        let Some(entry) = route.methods().resolve(request.method()) else {
            let allow = route.methods().allowed().join(", ");
            tracing::debug!(
                method = %request.method(),
                route = route.target(),
                "route matched but method not allowed"
            );
            return Box::pin(async move {
                Ok(response
                    .with_status(StatusCode::MethodNotAllowed)
                    .with_header("Allow", allow))
            });
        };

        tracing::debug!(
            method = %request.method(),
            route = route.target(),
            "route matched"
        );
        let entry = entry.clone();
        let request = request.with_attributes(variables);
        self.dispatcher.dispatch(vec![entry], request, response, next)
    }
}

impl Middleware for Router {
    /// Lets a router serve as one handler inside an outer chain.
    fn handle(&self, request: Request, response: Response, next: Next) -> MiddlewareFuture {
        let resume: Continuation =
            Arc::new(move |request, response| next.clone().run(request, response));
        self.dispatch(request, response, resume)
    }
}
