//! Bindings from operationId to handler.

use std::collections::HashMap;
use std::sync::Arc;

use crate::handler::{BoxedHandler, Handler};
use crate::middleware::BoxedMiddleware;

/// A handler plus the middleware scoped to its one route.
///
/// ```rust
/// use apigen::{RouteDefinition, Request, middleware};
///
/// async fn list_users(_req: Request) -> &'static str { "[]" }
///
/// let route = RouteDefinition::new(list_users).layer(middleware::trace());
/// # let _ = route;
/// ```
#[derive(Clone)]
pub struct RouteDefinition {
    pub(crate) handler: BoxedHandler,
    pub(crate) middleware: Vec<BoxedMiddleware>,
}

impl RouteDefinition {
    pub fn new(handler: impl Handler) -> Self {
        Self { handler: handler.into_boxed_handler(), middleware: Vec::new() }
    }

    /// Adds route-scoped middleware. The first one added is outermost.
    pub fn layer(mut self, middleware: BoxedMiddleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn middleware(&self) -> &[BoxedMiddleware] {
        &self.middleware
    }
}

/// Caller-owned bindings from operationId to [`RouteDefinition`].
///
/// Keys the document never mentions are inert. Operations the document
/// declares but this map lacks are answered with `501 Not Implemented` by
/// the compiled router.
#[derive(Clone, Default)]
pub struct OperationMap {
    routes: HashMap<String, RouteDefinition>,
}

impl OperationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `operation_id` to a bare handler. Returns `self` for chaining.
    pub fn handler(self, operation_id: impl Into<String>, handler: impl Handler) -> Self {
        self.route(operation_id, RouteDefinition::new(handler))
    }

    /// Binds `operation_id` to a handler with route-scoped middleware.
    /// Rebinding an id replaces the previous definition.
    pub fn route(mut self, operation_id: impl Into<String>, route: RouteDefinition) -> Self {
        self.insert(operation_id, route);
        self
    }

    /// Binds in place, returning the definition it replaced.
    pub fn insert(
        &mut self,
        operation_id: impl Into<String>,
        route: RouteDefinition,
    ) -> Option<RouteDefinition> {
        self.routes.insert(operation_id.into(), route)
    }

    pub fn get(&self, operation_id: &str) -> Option<&RouteDefinition> {
        self.routes.get(operation_id)
    }

    pub fn contains(&self, operation_id: &str) -> bool {
        self.routes.contains_key(operation_id)
    }

    pub fn len(&self) -> usize { self.routes.len() }
    pub fn is_empty(&self) -> bool { self.routes.is_empty() }

    /// Bound operationIds, in no particular order.
    pub fn operation_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.routes.keys().map(String::as_str)
    }

    pub(crate) fn handler_for(&self, operation_id: &str) -> Option<(BoxedHandler, &[BoxedMiddleware])> {
        self.routes
            .get(operation_id)
            .map(|route| (Arc::clone(&route.handler), route.middleware.as_slice()))
    }
}
