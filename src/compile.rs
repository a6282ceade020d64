//! Compiles a [`Document`] and an [`OperationMap`] into a [`Router`].
//!
//! Every (path, method) whose operation carries an operationId becomes one
//! route. Bound ids get their handler wrapped in their route-scoped
//! middleware; unbound ids get a handler that answers `501 Not Implemented`.
//! Operations without an id are skipped, so requests for them fall through
//! to the router's own 404/405.
//!
//! Traversal is declaration order: paths as declared, methods as declared
//! within a path (for loaded documents, the fixed `get, put, post, delete,
//! options, head, patch, trace` order).

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use tracing::{debug, info, warn};

use crate::document::Document;
use crate::error::CompileError;
use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::method::Method;
use crate::middleware::{self, BoxedMiddleware};
use crate::operation::OperationMap;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// Builds a router with no router-wide middleware.
///
/// ```rust
/// use apigen::{Document, OperationMap, Request, compile};
///
/// async fn list_users(_req: Request) -> &'static str { "[]" }
///
/// let doc = Document::new()
///     .operation("/users", "get", "listUsers")
///     .operation("/users/{userId}", "get", "getUserById");
/// let ops = OperationMap::new().handler("listUsers", list_users);
///
/// // GET /users → list_users; GET /users/{userId} → 501.
/// let router = compile(&doc, &ops)?;
/// # let _ = router;
/// # Ok::<(), apigen::CompileError>(())
/// ```
pub fn compile(document: &Document, operations: &OperationMap) -> Result<Router, CompileError> {
    compile_with(document, operations, [])
}

/// Builds a router and installs `global` at its root, in order, ahead of
/// every route's own middleware.
pub fn compile_with(
    document: &Document,
    operations: &OperationMap,
    global: impl IntoIterator<Item = BoxedMiddleware>,
) -> Result<Router, CompileError> {
    let mut router = global.into_iter().fold(Router::new(), Router::layer);

    let mut bound = 0usize;
    let mut fallbacks = 0usize;
    // operationId -> first (method, path) it was registered at
    let mut seen: HashMap<&str, (Method, &str)> = HashMap::new();

    for (path, operation) in document.operations() {
        let Some(operation_id) = operation.operation_id() else {
            debug!(path, method = operation.method(), "no operationId, skipping");
            continue;
        };
        let method = Method::from_document_key(operation.method()).ok_or_else(|| {
            CompileError::UnsupportedMethod {
                path: path.to_owned(),
                method: operation.method().to_owned(),
            }
        })?;

        match seen.entry(operation_id) {
            Entry::Occupied(first) => {
                let (first_method, first_path) = *first.get();
                warn!(
                    operation_id,
                    %first_method,
                    first_path,
                    %method,
                    path,
                    "operationId declared more than once",
                );
            }
            Entry::Vacant(slot) => {
                slot.insert((method, path));
            }
        }

        let handler = match operations.handler_for(operation_id) {
            Some((handler, scoped)) => {
                bound += 1;
                middleware::layered(scoped, handler)
            }
            None => {
                fallbacks += 1;
                warn!(operation_id, %method, path, "no handler bound, answering 501");
                not_implemented(operation_id)
            }
        };

        router
            .insert(method, path, handler, Some(Arc::from(operation_id)))
            .map_err(|source| CompileError::Route { method, path: path.to_owned(), source })?;
        debug!(operation_id, %method, path, "registered route");
    }

    let declared: HashSet<&str> = seen.into_keys().collect();
    for id in operations.operation_ids().filter(|id| !declared.contains(id)) {
        debug!(operation_id = id, "bound operation is not in the document");
    }

    info!(bound, fallbacks, title = document.title(), "router compiled");
    Ok(router)
}

/// Body of the response for an operation nobody bound.
pub fn not_implemented_body(operation_id: &str) -> String {
    format!("Operation \"{operation_id}\" is not implemented\n")
}

/// Handler for an unbound operation: `501`, the body above, no headers.
fn not_implemented(operation_id: &str) -> BoxedHandler {
    Arc::new(NotImplemented { body: Bytes::from(not_implemented_body(operation_id)) })
}

struct NotImplemented {
    body: Bytes,
}

impl ErasedHandler for NotImplemented {
    fn call(&self, _req: Request) -> BoxFuture {
        let res = Response::builder()
            .status(StatusCode::NOT_IMPLEMENTED)
            .body(self.body.clone());
        Box::pin(async move { res })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_body_format() {
        assert_eq!(
            not_implemented_body("getUserById"),
            "Operation \"getUserById\" is not implemented\n",
        );
    }

    #[tokio::test]
    async fn fallback_ignores_the_request() {
        let handler = not_implemented("createUser");
        let a = handler.call(Request::new(Method::Post, "/users").with_body("{}")).await;
        let b = handler.call(Request::new(Method::Get, "/elsewhere?x=1")).await;
        for res in [&a, &b] {
            assert_eq!(res.status_code(), StatusCode::NOT_IMPLEMENTED);
            assert!(res.headers().is_empty());
        }
        assert_eq!(a.body(), b.body());
    }

    #[test]
    fn unsupported_method_is_an_error() {
        let doc = Document::new().operation("/users", "fetch", "listUsers");
        let err = compile(&doc, &OperationMap::new()).unwrap_err();
        assert!(matches!(
            err,
            CompileError::UnsupportedMethod { ref path, ref method } if path == "/users" && method == "fetch"
        ));
    }

    #[test]
    fn skipped_operations_do_not_need_a_valid_method() {
        let doc = Document::new().operation("/users", "fetch", "");
        assert!(compile(&doc, &OperationMap::new()).is_ok());
    }
}
