//! # apigen
//!
//! Turn an OpenAPI document into a ready-to-serve router.
//!
//! You write one async handler per `operationId`. apigen reads the document,
//! registers each declared (method, path) under the handler bound to its
//! operationId, and answers every operation you have not bound yet with
//! `501 Not Implemented`. Nothing else: no schema validation, no response
//! serialization, no authentication.
//!
//! ## The pieces
//!
//! - [`load`] / [`load_str`]: parse and structurally validate a document
//!   (YAML or JSON) into a [`Document`]
//! - [`OperationMap`]: your bindings, operationId → [`RouteDefinition`]
//! - [`compile`] / [`compile_with`]: document + bindings (+ router-wide
//!   middleware) → [`Router`]
//! - [`Server`]: serves a router over HTTP/1.1 and HTTP/2 with graceful
//!   shutdown
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use apigen::{OperationMap, Request, Response, RouteDefinition, Server, middleware};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let doc = apigen::load("openapi.yaml")?;
//!
//!     let ops = OperationMap::new()
//!         .handler("listUsers", list_users)
//!         .route("getUserById", RouteDefinition::new(get_user).layer(middleware::trace()));
//!
//!     let router = apigen::compile_with(&doc, &ops, [middleware::trace()])?;
//!     Server::bind("0.0.0.0:8080")?.serve(router).await?;
//!     Ok(())
//! }
//!
//! async fn list_users(_req: Request) -> Response {
//!     Response::json(r#"[{"userId":"u1"}]"#)
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.path_param("userId");
//!     Response::json(format!(r#"{{"userId":"{id}"}}"#))
//! }
//! ```

mod compile;
mod document;
mod error;
mod handler;
mod loader;
mod method;
mod operation;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;

pub use compile::{compile, compile_with, not_implemented_body};
pub use document::{Document, Operation, PathEntry};
pub use error::{CompileError, Error, LoadError, ParseError, ValidationError, ValidationIssue};
pub use handler::{BoxFuture, Handler};
pub use http::StatusCode;
pub use loader::{Format, load, load_str};
pub use method::{Method, UnknownMethod};
pub use operation::{OperationMap, RouteDefinition};
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
