//! The routing-relevant view of an OpenAPI document.
//!
//! Only what the compiler needs survives loading: path templates in
//! declaration order, and under each the method keys with their operationIds.
//! Schemas, parameters and responses stay in the source document.

/// An ordered collection of [`PathEntry`], as declared.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    pub(crate) title: String,
    pub(crate) version: String,
    pub(crate) paths: Vec<PathEntry>,
}

/// One path template and the operations declared under it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathEntry {
    pub(crate) template: String,
    pub(crate) operations: Vec<Operation>,
}

/// One (path, method) slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operation {
    pub(crate) method: String,
    pub(crate) operation_id: Option<String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an operation. Returns `self` for chaining.
    ///
    /// Paths keep the order of their first declaration; operations keep
    /// theirs within a path. Declaring a method a path already has (compared
    /// case-insensitively) replaces that slot in place. An empty
    /// `operation_id` declares an operation without one.
    ///
    /// ```rust
    /// use apigen::Document;
    ///
    /// let doc = Document::new()
    ///     .operation("/users", "get", "listUsers")
    ///     .operation("/users/{userId}", "get", "getUserById");
    /// assert_eq!(doc.operation_count(), 2);
    /// ```
    pub fn operation(
        mut self,
        path: &str,
        method: &str,
        operation_id: impl Into<String>,
    ) -> Self {
        let operation_id = Some(operation_id.into()).filter(|id| !id.is_empty());
        let operation = Operation { method: method.to_owned(), operation_id };

        let entry = match self.paths.iter().position(|p| p.template == path) {
            Some(i) => &mut self.paths[i],
            None => {
                self.paths.push(PathEntry { template: path.to_owned(), operations: Vec::new() });
                let last = self.paths.len() - 1;
                &mut self.paths[last]
            }
        };
        match entry.operations.iter_mut().find(|o| o.method.eq_ignore_ascii_case(method)) {
            Some(slot) => *slot = operation,
            None => entry.operations.push(operation),
        }
        self
    }

    pub fn with_info(mut self, title: impl Into<String>, version: impl Into<String>) -> Self {
        self.title = title.into();
        self.version = version.into();
        self
    }

    /// `info.title` of a loaded document.
    pub fn title(&self) -> &str { &self.title }
    /// `info.version` of a loaded document.
    pub fn version(&self) -> &str { &self.version }

    pub fn paths(&self) -> &[PathEntry] { &self.paths }

    /// Every (path template, operation) pair, in traversal order.
    pub fn operations(&self) -> impl Iterator<Item = (&str, &Operation)> + '_ {
        self.paths.iter().flat_map(|entry| {
            entry.operations.iter().map(move |op| (entry.template.as_str(), op))
        })
    }

    pub fn operation_count(&self) -> usize {
        self.paths.iter().map(|p| p.operations.len()).sum()
    }
}

impl PathEntry {
    /// The URL template, e.g. `/users/{userId}`.
    pub fn template(&self) -> &str { &self.template }
    pub fn operations(&self) -> &[Operation] { &self.operations }
}

impl Operation {
    /// The method key as written in the document (`get`, `Get`, ...).
    pub fn method(&self) -> &str { &self.method }

    /// The operationId, unless it was absent or empty.
    pub fn operation_id(&self) -> Option<&str> { self.operation_id.as_deref() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_declaration_order() {
        let doc = Document::new()
            .operation("/users/{userId}", "get", "getUserById")
            .operation("/users", "post", "createUser")
            .operation("/users/{userId}", "delete", "deleteUser");

        let seen: Vec<_> = doc.operations()
            .map(|(path, op)| (path, op.method(), op.operation_id().unwrap_or("")))
            .collect();
        assert_eq!(seen, [
            ("/users/{userId}", "get", "getUserById"),
            ("/users/{userId}", "delete", "deleteUser"),
            ("/users", "post", "createUser"),
        ]);
    }

    #[test]
    fn redeclaring_a_method_replaces_the_slot() {
        let doc = Document::new()
            .operation("/users", "get", "listUsers")
            .operation("/users", "GET", "listAllUsers");
        assert_eq!(doc.operation_count(), 1);
        let op = &doc.paths()[0].operations()[0];
        assert_eq!(op.method(), "GET");
        assert_eq!(op.operation_id(), Some("listAllUsers"));
    }

    #[test]
    fn empty_operation_id_is_absent() {
        let doc = Document::new().operation("/health", "get", "");
        assert_eq!(doc.paths()[0].operations()[0].operation_id(), None);
    }
}
