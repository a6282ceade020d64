use std::fs;
use std::path::PathBuf;

use apigen::{
    Format, LoadError, Method, OperationMap, ParseError, Request, StatusCode, ValidationIssue,
    compile, load, load_str,
};

const USERS_YAML: &str = r#"
openapi: 3.0.3
info:
  title: Users API
  version: 1.0.0
paths:
  /users:
    get:
      operationId: listUsers
      responses:
        "200":
          description: ok
    post:
      responses:
        "201":
          description: created
  /users/{userId}:
    Get:
      operationId: getUserById
      parameters:
        - name: userId
          in: path
          required: true
          schema:
            type: string
      responses:
        "200":
          description: ok
    delete:
      operationId: deleteUser
      responses:
        "204":
          description: deleted
"#;

fn write_fixture(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn issues(err: LoadError) -> Vec<ValidationIssue> {
    match err {
        LoadError::Validation(v) => v.issues,
        other => panic!("expected a validation error, got: {other}"),
    }
}

#[test]
fn loads_yaml_in_declaration_order() {
    let dir = tempfile::tempdir().unwrap();
    let doc = load(write_fixture(&dir, "openapi.yaml", USERS_YAML)).unwrap();

    assert_eq!(doc.title(), "Users API");
    assert_eq!(doc.version(), "1.0.0");

    let seen: Vec<_> = doc.operations()
        .map(|(path, op)| (path, op.method(), op.operation_id()))
        .collect();
    assert_eq!(seen, [
        ("/users", "get", Some("listUsers")),
        ("/users", "post", None),
        ("/users/{userId}", "get", Some("getUserById")),
        ("/users/{userId}", "delete", Some("deleteUser")),
    ]);
}

#[test]
fn loads_json_by_extension() {
    let json = r#"{
        "openapi": "3.0.0",
        "info": { "title": "Pets", "version": "2" },
        "paths": {
            "/pets/{petId}": {
                "get": { "operationId": "getPet", "responses": { "200": { "description": "ok" } } }
            },
            "/pets": {
                "get": { "operationId": "listPets", "responses": { "200": { "description": "ok" } } }
            }
        }
    }"#;
    let dir = tempfile::tempdir().unwrap();
    let doc = load(write_fixture(&dir, "pets.json", json)).unwrap();

    let templates: Vec<_> = doc.paths().iter().map(|p| p.template()).collect();
    assert_eq!(templates, ["/pets/{petId}", "/pets"]);
}

#[tokio::test]
async fn loaded_document_compiles_end_to_end() {
    let doc = load_str(USERS_YAML, Format::Yaml).unwrap();
    let ops = OperationMap::new().handler("getUserById", |req: Request| async move {
        req.path_param("userId").to_owned()
    });
    let router = compile(&doc, &ops).unwrap();

    let res = router.handle(Request::new(Method::Get, "/users/u1")).await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.body(), b"u1");

    let res = router.handle(Request::new(Method::Delete, "/users/u1")).await;
    assert_eq!(res.status_code(), StatusCode::NOT_IMPLEMENTED);
    assert_eq!(res.body(), b"Operation \"deleteUser\" is not implemented\n");

    // POST /users has no operationId.
    let res = router.handle(Request::new(Method::Post, "/users")).await;
    assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);
}

#[test]
fn unquoted_scalars_read_as_text() {
    let yaml = r#"
openapi: 3.0.3
info:
  title: Users API
  version: 1.0
paths:
  /users:
    get:
      operationId: 2024
      responses:
        200:
          description: ok
"#;
    let doc = load_str(yaml, Format::Yaml).unwrap();
    assert_eq!(doc.version(), "1.0");
    let ids: Vec<_> = doc.operations().map(|(_, op)| op.operation_id()).collect();
    assert_eq!(ids, [Some("2024")]);
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.yaml");
    match load(&missing) {
        Err(LoadError::Read { path, source }) => {
            assert_eq!(path, missing);
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected a read error, got: {:?}", other.err()),
    }
}

#[test]
fn malformed_text_is_a_parse_error() {
    let err = load_str("openapi: [3.0.0", Format::Yaml).unwrap_err();
    assert!(matches!(err, LoadError::Parse(ParseError::Yaml(_))), "{err}");

    let err = load_str("{\"openapi\": ", Format::Json).unwrap_err();
    assert!(matches!(err, LoadError::Parse(ParseError::Json(_))), "{err}");
}

#[test]
fn wrong_shape_is_a_parse_error() {
    let err = load_str("openapi: 3.0.0\npaths: {}\n", Format::Yaml).unwrap_err();
    assert!(matches!(err, LoadError::Parse(ParseError::Document(_))), "{err}");
}

#[test]
fn duplicate_operation_ids_are_rejected() {
    let yaml = r#"
openapi: 3.0.3
info: { title: Users API, version: "1" }
paths:
  /users:
    get:
      operationId: listUsers
      responses: { "200": { description: ok } }
  /people:
    get:
      operationId: listUsers
      responses: { "200": { description: ok } }
"#;
    let found = issues(load_str(yaml, Format::Yaml).unwrap_err());
    assert_eq!(found, [ValidationIssue::DuplicateOperationId {
        id: "listUsers".into(),
        first: "GET /users".into(),
        second: "GET /people".into(),
    }]);
}

#[test]
fn collects_every_structural_issue() {
    let yaml = r#"
openapi: 3.1.0
info: { title: "", version: "1" }
paths:
  users:
    get:
      responses: { "200": { description: ok } }
  /users/{userId:
    get:
      responses: { "200": { description: ok } }
  /shared:
    $ref: "./shared.yaml#/paths/~1shared"
  /twice:
    get:
      responses: { "200": { description: ok } }
    GET:
      responses: { "200": { description: ok } }
"#;
    let found = issues(load_str(yaml, Format::Yaml).unwrap_err());
    assert_eq!(found, [
        ValidationIssue::RelativePath("users".into()),
        ValidationIssue::DuplicateMethod { path: "/twice".into(), method: "get".into() },
        ValidationIssue::UnsupportedVersion("3.1.0".into()),
        ValidationIssue::MissingTitle,
        ValidationIssue::MalformedTemplate("/users/{userId".into()),
        ValidationIssue::PathReference("/shared".into()),
    ]);
}

#[test]
fn validation_error_lists_every_issue() {
    let yaml = "openapi: 2.0.0\ninfo: { title: '', version: '' }\npaths: {}\n";
    let err = load_str(yaml, Format::Yaml).unwrap_err();
    assert_eq!(
        err.to_string(),
        "OpenAPI validation error: unsupported OpenAPI version `2.0.0`, expected 3.0.x, \
         info.title must not be empty, info.version must not be empty",
    );
}
