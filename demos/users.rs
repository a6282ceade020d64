//! Serve `demos/openapi.yaml` with two of its three operations bound.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example users
//!
//! Try:
//!   curl http://localhost:8080/users?limit=2
//!   curl http://localhost:8080/users/u1
//!   curl -X POST http://localhost:8080/users      ← 501, createUser is unbound
//!
//! `APIGEN_SPEC` and `APIGEN_ADDR` override the document path and the bind
//! address.

use apigen::middleware::{self, BoxedMiddleware, Next};
use apigen::{OperationMap, Request, Response, RouteDefinition, Server, StatusCode};
use serde_json::json;
use tracing_subscriber::EnvFilter;

const USERS: [(&str, &str); 3] = [("u1", "Alice"), ("u2", "Bob"), ("u3", "Charlie")];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let spec = std::env::var("APIGEN_SPEC")
        .unwrap_or_else(|_| concat!(env!("CARGO_MANIFEST_DIR"), "/demos/openapi.yaml").to_owned());
    let addr = std::env::var("APIGEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned());

    let doc = apigen::load(&spec)?;

    let ops = OperationMap::new()
        .route("listUsers", RouteDefinition::new(list_users).layer(log_operation("listUsers")))
        .route("getUserById", RouteDefinition::new(get_user).layer(log_operation("getUserById")));

    let router = apigen::compile_with(&doc, &ops, [middleware::trace()])?;

    Server::bind(&addr)?.serve(router).await?;
    Ok(())
}

// GET /users?limit=N
async fn list_users(req: Request) -> Response {
    let limit = match req.query_param("limit").map(str::parse::<usize>) {
        None => 10,
        Some(Ok(limit)) => limit,
        Some(Err(_)) => {
            return Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .text("invalid limit param");
        }
    };

    let users: Vec<_> = USERS.iter()
        .take(limit)
        .map(|(id, name)| json!({ "userId": id, "name": name }))
        .collect();
    Response::json(json!(users).to_string())
}

// GET /users/{userId}
async fn get_user(req: Request) -> Response {
    let id = req.path_param("userId");
    match USERS.iter().find(|(user_id, _)| *user_id == id) {
        Some((user_id, name)) => Response::json(json!({ "userId": user_id, "name": name }).to_string()),
        None => Response::builder().status(StatusCode::NOT_FOUND).text("User not found"),
    }
}

/// Logs which operation a request was routed to.
fn log_operation(operation_id: &'static str) -> BoxedMiddleware {
    middleware::from_fn(move |req: Request, next: Next| async move {
        tracing::info!(operation_id, "operation called");
        next.run(req).await
    })
}
