//! Incoming HTTP request type.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;

use crate::method::Method;

/// An incoming HTTP request.
///
/// The server builds one per hyper request; tests and other in-process
/// callers build one with [`Request::new`] and hand it to
/// [`Router::handle`](crate::Router::handle).
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
    pub(crate) route: Option<Arc<str>>,
    pub(crate) operation_id: Option<Arc<str>>,
}

impl Request {
    /// A request with no headers and an empty body.
    ///
    /// `uri` is a path with an optional query string: `/users?limit=2`.
    pub fn new(method: Method, uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, Some(query.to_owned())),
            None => (uri, None),
        };
        Self::from_parts(method, path.to_owned(), query, Vec::new(), Bytes::new())
    }

    pub(crate) fn from_parts(
        method: Method,
        path: String,
        query: Option<String>,
        headers: Vec<(String, String)>,
        body: Bytes,
    ) -> Self {
        Self {
            method,
            path,
            query,
            headers,
            body,
            params: HashMap::new(),
            route: None,
            operation_id: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> Option<&str> { self.query.as_deref() }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// First raw value of a query-string key. Not percent-decoded.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.as_deref()?
            .split('&')
            .filter_map(|pair| match pair.split_once('=') {
                Some((k, v)) => Some((k, v)),
                None if !pair.is_empty() => Some((pair, "")),
                None => None,
            })
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Like [`param`](Request::param), but an unbound placeholder reads as `""`.
    pub fn path_param(&self, key: &str) -> &str {
        self.param(key).unwrap_or_default()
    }

    /// The path template the router matched, e.g. `/users/{userId}`.
    pub fn route(&self) -> Option<&str> { self.route.as_deref() }

    /// The operationId of the matched route, when it was compiled from a
    /// document.
    pub fn operation_id(&self) -> Option<&str> { self.operation_id.as_deref() }
}
