//! Loading and structural validation of OpenAPI documents.
//!
//! ```text
//! file / string (YAML or JSON)
//!     → serde_yaml / serde_json        (ParseError::Yaml / Json)
//!     → path keys checked, method keys case-folded
//!     → openapiv3::OpenAPI             (ParseError::Document)
//!     → structural checks              (ValidationError, all issues at once)
//!     → Document
//! ```

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::path::Path;

use openapiv3::{OpenAPI, PathItem, ReferenceOr};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::document::{Document, Operation, PathEntry};
use crate::error::{LoadError, ParseError, ValidationError, ValidationIssue};

/// Method keys a path item may carry, in the order operations are read.
const METHODS: [&str; 8] = ["get", "put", "post", "delete", "options", "head", "patch", "trace"];

/// Serialization of a document held in memory.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// `.json` files are JSON; everything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Reads, parses and validates the OpenAPI document at `path`.
pub fn load(path: impl AsRef<Path>) -> Result<Document, LoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|source| LoadError::Read { path: path.to_owned(), source })?;
    let document = load_str(&text, Format::from_path(path))?;
    info!(
        path = %path.display(),
        title = document.title(),
        operations = document.operation_count(),
        "loaded OpenAPI document",
    );
    Ok(document)
}

/// Parses and validates a document held in memory.
pub fn load_str(text: &str, format: Format) -> Result<Document, LoadError> {
    let mut value: Value = match format {
        Format::Yaml => serde_yaml::from_str(text).map_err(ParseError::from)?,
        Format::Json => serde_json::from_str(text).map_err(ParseError::from)?,
    };

    let mut issues = Vec::new();
    coerce_info(&mut value);
    prepare_paths(&mut value, &mut issues);

    let spec: OpenAPI = serde_json::from_value(value).map_err(ParseError::Document)?;
    let document = read_document(&spec, &mut issues);

    if issues.is_empty() {
        Ok(document)
    } else {
        Err(ValidationError { issues }.into())
    }
}

/// Reads unquoted YAML scalars as text where the document expects a string,
/// so `version: 1.0` is `"1.0"` rather than a float the typed parse rejects.
fn coerce_info(value: &mut Value) {
    stringify(value.get_mut("openapi"));
    if let Some(info) = value.get_mut("info") {
        stringify(info.get_mut("title"));
        stringify(info.get_mut("version"));
    }
}

fn stringify(slot: Option<&mut Value>) {
    let Some(slot) = slot else { return };
    let text = match slot {
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return,
    };
    *slot = Value::String(text);
}

/// Checks path keys and lowercases method keys under `paths.*`, so `Get`
/// is read as `get`. Runs on the raw value because the typed parse silently
/// drops path keys that do not start with `/`. Scalar operationIds are read
/// as text, like [`coerce_info`] does for `info`.
///
/// Key order is kept; two spellings of one method in the same path item are
/// reported and the later one dropped.
fn prepare_paths(value: &mut Value, issues: &mut Vec<ValidationIssue>) {
    let Some(Value::Object(paths)) = value.get_mut("paths") else {
        return;
    };
    for (path, item) in paths.iter_mut() {
        if !path.starts_with('/') && !path.starts_with("x-") {
            issues.push(ValidationIssue::RelativePath(path.clone()));
        }
        let Value::Object(item) = item else { continue };
        if item.keys().any(|k| is_method(k) && k.bytes().any(|b| b.is_ascii_uppercase())) {
            fold_method_keys(path, item, issues);
        }
        for (_, op) in item.iter_mut().filter(|(key, _)| is_method(key)) {
            stringify(op.get_mut("operationId"));
        }
    }
}

fn fold_method_keys(path: &str, item: &mut Map<String, Value>, issues: &mut Vec<ValidationIssue>) {
    let original = std::mem::take(item);
    let mut folded = Map::with_capacity(original.len());
    for (key, op) in original {
        let key = if is_method(&key) { key.to_ascii_lowercase() } else { key };
        if folded.contains_key(&key) {
            issues.push(ValidationIssue::DuplicateMethod { path: path.to_owned(), method: key });
            continue;
        }
        folded.insert(key, op);
    }
    debug!(path, "case-folded method keys");
    *item = folded;
}

fn is_method(key: &str) -> bool {
    METHODS.iter().any(|m| m.eq_ignore_ascii_case(key))
}

fn read_document(spec: &OpenAPI, issues: &mut Vec<ValidationIssue>) -> Document {
    if !spec.openapi.starts_with("3.0.") {
        issues.push(ValidationIssue::UnsupportedVersion(spec.openapi.clone()));
    }
    if spec.info.title.trim().is_empty() {
        issues.push(ValidationIssue::MissingTitle);
    }
    if spec.info.version.trim().is_empty() {
        issues.push(ValidationIssue::MissingVersion);
    }

    let mut document = Document::new().with_info(&spec.info.title, &spec.info.version);
    // operationId -> "METHOD /path" of its first use
    let mut seen: HashMap<&str, String> = HashMap::new();

    for (path, item) in &spec.paths.paths {
        if !is_well_formed_template(path) {
            issues.push(ValidationIssue::MalformedTemplate(path.clone()));
        }
        let item = match item {
            ReferenceOr::Item(item) => item,
            ReferenceOr::Reference { .. } => {
                issues.push(ValidationIssue::PathReference(path.clone()));
                continue;
            }
        };

        let mut entry = PathEntry { template: path.clone(), operations: Vec::new() };
        for (method, op) in operations(item) {
            let operation_id = op.operation_id.as_deref().filter(|id| !id.is_empty());
            if let Some(id) = operation_id {
                let here = format!("{} {path}", method.to_ascii_uppercase());
                match seen.entry(id) {
                    Entry::Occupied(first) => issues.push(ValidationIssue::DuplicateOperationId {
                        id: id.to_owned(),
                        first: first.get().clone(),
                        second: here,
                    }),
                    Entry::Vacant(slot) => {
                        slot.insert(here);
                    }
                }
            }
            entry.operations.push(Operation {
                method: method.to_owned(),
                operation_id: operation_id.map(str::to_owned),
            });
        }
        document.paths.push(entry);
    }
    document
}

fn operations(item: &PathItem) -> impl Iterator<Item = (&'static str, &openapiv3::Operation)> + '_ {
    let slots = [&item.get, &item.put, &item.post, &item.delete, &item.options, &item.head, &item.patch, &item.trace];
    METHODS.into_iter()
        .zip(slots)
        .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
}

/// Placeholders must be non-empty and not nested: `/a/{b}/c` is fine,
/// `/a/{}` and `/a/{b` are not.
fn is_well_formed_template(path: &str) -> bool {
    let mut open: Option<usize> = None;
    for (i, c) in path.char_indices() {
        match (c, open) {
            ('{', None) => open = Some(i),
            ('}', Some(start)) if i > start + 1 => open = None,
            ('{', Some(_)) | ('}', _) => return false,
            _ => {}
        }
    }
    open.is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn format_follows_extension() {
        assert_eq!(Format::from_path(Path::new("api.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new("api.JSON")), Format::Json);
        assert_eq!(Format::from_path(Path::new("api.yaml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("openapi")), Format::Yaml);
    }

    #[test]
    fn templates() {
        assert!(is_well_formed_template("/users"));
        assert!(is_well_formed_template("/users/{userId}/posts/{postId}"));
        assert!(!is_well_formed_template("/users/{}"));
        assert!(!is_well_formed_template("/users/{userId"));
        assert!(!is_well_formed_template("/users/userId}"));
        assert!(!is_well_formed_template("/users/{{userId}}"));
    }

    #[test]
    fn folds_mixed_case_method_keys_in_place() {
        let mut v = json!({
            "paths": { "/x": { "summary": "s", "Get": {}, "POST": {}, "x-Trace": {} } }
        });
        let mut issues = Vec::new();
        prepare_paths(&mut v, &mut issues);
        assert!(issues.is_empty());
        let keys: Vec<_> = v["paths"]["/x"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["summary", "get", "post", "x-Trace"]);
    }

    #[test]
    fn reports_relative_paths_before_typed_parse() {
        let mut v = json!({ "paths": { "users": {}, "/users": {}, "x-meta": {} } });
        let mut issues = Vec::new();
        prepare_paths(&mut v, &mut issues);
        assert_eq!(issues, [ValidationIssue::RelativePath("users".into())]);
    }

    #[test]
    fn scalar_text_fields_become_strings() {
        let mut v = json!({
            "openapi": "3.0.3",
            "info": { "title": 42, "version": 1.0 },
            "paths": { "/x": { "Get": { "operationId": 7 }, "parameters": [] } }
        });
        coerce_info(&mut v);
        prepare_paths(&mut v, &mut Vec::new());
        assert_eq!(v["info"], json!({ "title": "42", "version": "1.0" }));
        assert_eq!(v["paths"]["/x"]["get"]["operationId"], "7");
        assert_eq!(v["paths"]["/x"]["parameters"], json!([]));
    }

    #[test]
    fn reports_two_spellings_of_one_method() {
        let mut v = json!({ "paths": { "/x": { "get": {}, "GET": {} } } });
        let mut issues = Vec::new();
        prepare_paths(&mut v, &mut issues);
        assert_eq!(issues, [ValidationIssue::DuplicateMethod { path: "/x".into(), method: "get".into() }]);
    }
}
