//! Error types.
//!
//! Application-level errors (404, 501, etc.) are expressed as HTTP
//! [`Response`](crate::Response) values, not as errors. The types here
//! surface the three places that can actually fail: loading a document,
//! compiling it into a router, and running the server.

use std::fmt;
use std::io;
use std::net::AddrParseError;
use std::path::PathBuf;

use thiserror::Error;

use crate::method::Method;

/// Returned by [`Server`](crate::Server): binding or accepting failed.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("invalid socket address: {0}")]
    Addr(#[from] AddrParseError),
}

/// Returned by [`compile`](crate::compile) when the document cannot be
/// turned into routes.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A method key that is not an HTTP method the router knows.
    #[error("unsupported method `{method}` on path `{path}`")]
    UnsupportedMethod { path: String, method: String },

    /// The routing engine rejected the template: malformed placeholders, or
    /// a template that conflicts with one already registered for the method.
    #[error("cannot register `{method} {path}`: {source}")]
    Route {
        method: Method,
        path: String,
        #[source]
        source: matchit::InsertError,
    },
}

/// Returned by [`load`](crate::load) and [`load_str`](crate::load_str).
///
/// The kinds stay distinct so callers can react differently: a `Read` error
/// usually means a packaging problem, `Parse` and `Validation` mean the
/// document itself is wrong.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse OpenAPI data: {0}")]
    Parse(#[from] ParseError),

    #[error("OpenAPI validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// The document text could not be turned into an OpenAPI object.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Well-formed YAML/JSON that is not shaped like an OpenAPI document.
    #[error("not an OpenAPI document: {0}")]
    Document(#[source] serde_json::Error),
}

/// Every structural problem found in a parsed document.
#[derive(Debug, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 { f.write_str(", ")?; }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// One structural problem in a document.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationIssue {
    #[error("unsupported OpenAPI version `{0}`, expected 3.0.x")]
    UnsupportedVersion(String),

    #[error("info.title must not be empty")]
    MissingTitle,

    #[error("info.version must not be empty")]
    MissingVersion,

    #[error("path `{0}` must start with `/`")]
    RelativePath(String),

    #[error("path `{0}` has a malformed `{{}}` placeholder")]
    MalformedTemplate(String),

    #[error("path `{0}` is a $ref, which is not supported")]
    PathReference(String),

    #[error("path `{path}` declares method `{method}` more than once")]
    DuplicateMethod { path: String, method: String },

    #[error("operationId `{id}` is used by both `{first}` and `{second}`")]
    DuplicateOperationId { id: String, first: String, second: String },
}
