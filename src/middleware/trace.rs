//! Per-request tracing span.

use std::time::Instant;

use tracing::{Instrument, info, info_span};

use super::{BoxedMiddleware, Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;

/// Middleware that wraps each request in an `http.request` span and logs
/// method, path, route template, operationId, status and latency once the
/// response is ready.
///
/// Install it router-wide so it also times the route-scoped middleware:
///
/// ```rust
/// use apigen::{Router, middleware};
///
/// let router = Router::new().layer(middleware::trace());
/// # let _ = router;
/// ```
pub fn trace() -> BoxedMiddleware {
    std::sync::Arc::new(Trace)
}

struct Trace;

impl Middleware for Trace {
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        let span = info_span!(
            "http.request",
            method = %req.method(),
            path = req.path(),
            route = req.route().unwrap_or(""),
            operation_id = req.operation_id().unwrap_or(""),
        );
        Box::pin(
            async move {
                let start = Instant::now();
                let res = next.run(req).await;
                info!(
                    status = res.status_code().as_u16(),
                    latency_us = start.elapsed().as_micros() as u64,
                    "request completed",
                );
                res
            }
            .instrument(span),
        )
    }
}
