//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns: structured tracing, request-id injection,
//! authentication-header inspection.
//!
//! A middleware receives the request and a [`Next`] handle to the rest of
//! the chain. It may answer on its own, or call [`Next::run`] and inspect
//! the response on the way back out:
//!
//! ```rust
//! use apigen::middleware::{self, Next};
//! use apigen::{Request, Response};
//!
//! let tag = middleware::from_fn(|req: Request, next: Next| async move {
//!     next.run(req).await.with_header("x-served-by", "apigen")
//! });
//! # let _ = tag;
//! ```
//!
//! Two scopes exist. Router-wide middleware ([`Router::layer`]) is installed
//! once at the router root and sees every matched request first.
//! Route-scoped middleware ([`RouteDefinition::layer`]) sits between it and
//! the handler. Within a scope the first middleware listed is the first to
//! see the request and the last to see the response.
//!
//! [`Router::layer`]: crate::Router::layer
//! [`RouteDefinition::layer`]: crate::RouteDefinition::layer

use std::future::Future;
use std::sync::Arc;

use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::request::Request;

mod trace;

pub use trace::trace;

/// A request/response wrapper around the rest of the chain.
///
/// Implemented for every `Fn(Request, Next) -> impl Future<Output = Response>`;
/// implement it by hand when the middleware carries configuration.
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: Request, next: Next) -> BoxFuture;
}

impl<F, Fut> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = crate::Response> + Send + 'static,
{
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        Box::pin((self)(req, next))
    }
}

/// A type-erased middleware, shareable between routes and routers.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Boxes an async closure as middleware.
pub fn from_fn<F, Fut>(f: F) -> BoxedMiddleware
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = crate::Response> + Send + 'static,
{
    Arc::new(f)
}

/// The remainder of a middleware chain: the middleware not yet run, then
/// the endpoint.
pub struct Next {
    stack: Arc<[BoxedMiddleware]>,
    index: usize,
    endpoint: BoxedHandler,
}

impl Next {
    pub(crate) fn new(stack: Arc<[BoxedMiddleware]>, endpoint: BoxedHandler) -> Self {
        Self { stack, index: 0, endpoint }
    }

    /// Passes the request down the chain and resolves to its response.
    pub fn run(self, req: Request) -> BoxFuture {
        match self.stack.get(self.index).cloned() {
            Some(middleware) => {
                let next = Self { index: self.index + 1, ..self };
                middleware.handle(req, next)
            }
            None => self.endpoint.call(req),
        }
    }
}

/// A handler with route-scoped middleware baked in.
struct Layered {
    stack: Arc<[BoxedMiddleware]>,
    endpoint: BoxedHandler,
}

impl ErasedHandler for Layered {
    fn call(&self, req: Request) -> BoxFuture {
        Next::new(Arc::clone(&self.stack), Arc::clone(&self.endpoint)).run(req)
    }
}

/// Wraps `endpoint` so that `stack` runs around it, first element outermost.
pub(crate) fn layered(stack: &[BoxedMiddleware], endpoint: BoxedHandler) -> BoxedHandler {
    if stack.is_empty() {
        return endpoint;
    }
    Arc::new(Layered { stack: stack.into(), endpoint })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::handler::Handler;
    use crate::{Method, Response};

    fn recorder(log: &Arc<Mutex<Vec<String>>>, name: &'static str) -> BoxedMiddleware {
        let log = Arc::clone(log);
        from_fn(move |req: Request, next: Next| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(format!("{name} in"));
                let res = next.run(req).await;
                log.lock().unwrap().push(format!("{name} out"));
                res
            }
        })
    }

    #[tokio::test]
    async fn first_listed_is_outermost() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let inner = Arc::clone(&log);
        let endpoint = (move |_req: Request| {
            let log = Arc::clone(&inner);
            async move {
                log.lock().unwrap().push("handler".to_owned());
                Response::text("ok")
            }
        })
        .into_boxed_handler();

        let handler = layered(&[recorder(&log, "a"), recorder(&log, "b")], endpoint);
        let res = handler.call(Request::new(Method::Get, "/")).await;

        assert_eq!(res.body(), b"ok");
        assert_eq!(
            *log.lock().unwrap(),
            ["a in", "b in", "handler", "b out", "a out"],
        );
    }

    #[tokio::test]
    async fn middleware_can_short_circuit() {
        let deny = from_fn(|_req: Request, _next: Next| async {
            Response::status(http::StatusCode::FORBIDDEN)
        });
        let endpoint = (|_req: Request| async { "unreachable" }).into_boxed_handler();

        let res = layered(&[deny], endpoint).call(Request::new(Method::Get, "/")).await;
        assert_eq!(res.status_code(), http::StatusCode::FORBIDDEN);
    }
}
