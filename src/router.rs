//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup via [`matchit`]. Path
//! templates use the OpenAPI placeholder syntax, `/users/{userId}`, which is
//! also matchit's, so document paths are registered verbatim.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use matchit::{InsertError, Router as MatchitRouter};

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::{self, BoxedMiddleware, Next};
use crate::operation::RouteDefinition;
use crate::request::Request;
use crate::response::Response;

/// What a matched path resolves to.
#[derive(Clone)]
struct Endpoint {
    handler: BoxedHandler,
    template: Arc<str>,
    operation_id: Option<Arc<str>>,
}

/// The application router.
///
/// Build it by hand with [`Router::on`] / [`Router::route`], or let
/// [`compile`](crate::compile) build it from an OpenAPI document. Either way
/// it is a plain value: any number of routers can coexist, and once handed
/// to [`Server::serve`](crate::Server::serve) it is only read.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<Endpoint>>,
    registered: Vec<(Method, Arc<str>)>,
    global: Arc<[BoxedMiddleware]>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            registered: Vec::new(),
            global: Vec::new().into(),
        }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// ```rust
    /// # use apigen::{Method, Request, Response, Router};
    /// # async fn get_user(_: Request) -> Response { Response::text("") }
    /// # async fn create_user(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::Get,  "/users/{id}", get_user)
    ///     .on(Method::Post, "/users",      create_user);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the template is malformed or conflicts with one already
    /// registered for `method`. Use [`Router::try_route`] to get the error
    /// back instead.
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.route(method, path, RouteDefinition::new(handler))
    }

    /// Like [`Router::on`], with route-scoped middleware.
    ///
    /// # Panics
    ///
    /// Under the same conditions as [`Router::on`].
    pub fn route(mut self, method: Method, path: &str, route: RouteDefinition) -> Self {
        if let Err(e) = self.try_route(method, path, &route) {
            panic!("invalid route `{method} {path}`: {e}");
        }
        self
    }

    /// Fallible registration: the route-scoped middleware of `route` is
    /// baked around its handler, then the result is inserted into the tree
    /// for `method`.
    pub fn try_route(
        &mut self,
        method: Method,
        path: &str,
        route: &RouteDefinition,
    ) -> Result<(), InsertError> {
        let handler = middleware::layered(&route.middleware, Arc::clone(&route.handler));
        self.insert(method, path, handler, None)
    }

    pub(crate) fn insert(
        &mut self,
        method: Method,
        path: &str,
        handler: BoxedHandler,
        operation_id: Option<Arc<str>>,
    ) -> Result<(), InsertError> {
        let template: Arc<str> = Arc::from(path);
        let endpoint = Endpoint { handler, template: Arc::clone(&template), operation_id };
        self.routes.entry(method).or_default().insert(path, endpoint)?;
        self.registered.push((method, template));
        Ok(())
    }

    /// Installs middleware at the router root. It runs before any
    /// route-scoped middleware, in the order layers were added.
    pub fn layer(mut self, middleware: BoxedMiddleware) -> Self {
        let mut stack = self.global.to_vec();
        stack.push(middleware);
        self.global = stack.into();
        self
    }

    /// Registered `(method, template)` pairs, in registration order.
    pub fn routes(&self) -> impl Iterator<Item = (Method, &str)> + '_ {
        self.registered.iter().map(|(method, path)| (*method, &**path))
    }

    /// Routes one request and produces one response.
    ///
    /// Unknown paths answer `404 Not Found`. A path registered only under
    /// other methods answers `405 Method Not Allowed` with an `allow` header.
    /// Router-wide middleware runs only for matched requests.
    pub async fn handle(&self, mut req: Request) -> Response {
        let Some(endpoint) = self.lookup(&mut req) else {
            return self.unmatched(req.method(), req.path());
        };
        Next::new(Arc::clone(&self.global), endpoint.handler).run(req).await
    }

    fn lookup(&self, req: &mut Request) -> Option<Endpoint> {
        let tree = self.routes.get(&req.method)?;
        let matched = tree.at(&req.path).ok()?;
        let endpoint = matched.value.clone();
        req.params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        req.route = Some(Arc::clone(&endpoint.template));
        req.operation_id = endpoint.operation_id.clone();
        Some(endpoint)
    }

    fn unmatched(&self, method: Method, path: &str) -> Response {
        let mut allowed = self.allowed(path);
        allowed.remove(&method);
        Self::not_routed(&allowed)
    }

    /// Methods with a route matching `path`.
    pub(crate) fn allowed(&self, path: &str) -> BTreeSet<Method> {
        self.routes.iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(m, _)| *m)
            .collect()
    }

    /// `404` when nothing serves the path, otherwise `405` listing `allowed`.
    pub(crate) fn not_routed(allowed: &BTreeSet<Method>) -> Response {
        if allowed.is_empty() {
            return Response::status(StatusCode::NOT_FOUND);
        }
        let allow = allowed.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ");
        Response::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .header("allow", &allow)
            .no_body()
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes().map(|(m, p)| format!("{m} {p}")).collect::<Vec<_>>())
            .field("global_middleware", &self.global.len())
            .finish()
    }
}
