//! Shared data model: type identities, marker metadata, and candidate sites.

use crate::types::Location;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Kind of a type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// Reference type (`class`, `record`).
    Class,
    /// Interface type.
    Interface,
    /// Value type (`struct`, `record struct`, `enum`).
    Value,
}

/// Immutable identity of a type.
///
/// Equality and hashing use the fully qualified name only, so two references
/// to the same type compare equal even if the kind was inferred differently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRef {
    qualified_name: String,
    kind: TypeKind,
}

impl TypeRef {
    /// Creates a type reference.
    #[must_use]
    pub fn new(qualified_name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            kind,
        }
    }

    /// Creates a class type reference.
    #[must_use]
    pub fn class(qualified_name: impl Into<String>) -> Self {
        Self::new(qualified_name, TypeKind::Class)
    }

    /// Creates an interface type reference.
    #[must_use]
    pub fn interface(qualified_name: impl Into<String>) -> Self {
        Self::new(qualified_name, TypeKind::Interface)
    }

    /// Creates a value type reference.
    #[must_use]
    pub fn value(qualified_name: impl Into<String>) -> Self {
        Self::new(qualified_name, TypeKind::Value)
    }

    /// Fully qualified name (e.g., `Acme.Billing.IService`).
    #[must_use]
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Kind of the referenced type.
    #[must_use]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Simple name, without namespace.
    #[must_use]
    pub fn name(&self) -> &str {
        self.qualified_name
            .rsplit_once('.')
            .map_or(self.qualified_name.as_str(), |(_, name)| name)
    }

    /// Containing namespace, empty for the global namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.qualified_name
            .rsplit_once('.')
            .map_or("", |(namespace, _)| namespace)
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.qualified_name == other.qualified_name
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.qualified_name.hash(state);
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.qualified_name)
    }
}

/// A positional literal argument of a marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum AnnotationArg {
    /// String literal, already unescaped.
    String(String),
    /// The `null` literal.
    Null,
    /// Any other literal, kept as source text.
    Other(String),
}

impl AnnotationArg {
    /// Returns the string value for string literals.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Null | Self::Other(_) => None,
        }
    }
}

/// Marker metadata as declared directly on a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Marker type name (e.g., `DoNotMockAttribute`).
    pub name: String,
    /// Namespace of the marker type.
    pub namespace: String,
    /// Positional literal arguments in declaration order.
    pub arguments: Vec<AnnotationArg>,
}

impl Annotation {
    /// Creates an annotation without arguments.
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            arguments: Vec::new(),
        }
    }

    /// Appends a positional argument.
    #[must_use]
    pub fn with_argument(mut self, argument: AnnotationArg) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Appends a string argument.
    #[must_use]
    pub fn with_message(self, message: impl Into<String>) -> Self {
        self.with_argument(AnnotationArg::String(message.into()))
    }

    /// Remediation message: the first argument when it is a non-empty string.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.arguments
            .first()
            .and_then(AnnotationArg::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Identity of the no-mock marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerSpec {
    /// Marker type name.
    #[serde(default = "default_marker_name")]
    pub name: String,
    /// Marker namespace.
    #[serde(default = "default_marker_namespace")]
    pub namespace: String,
}

impl Default for MarkerSpec {
    fn default() -> Self {
        Self {
            name: default_marker_name(),
            namespace: default_marker_namespace(),
        }
    }
}

impl MarkerSpec {
    /// Creates a marker identity.
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Whether an annotation is this marker.
    #[must_use]
    pub fn matches(&self, annotation: &Annotation) -> bool {
        annotation.name == self.name && annotation.namespace == self.namespace
    }

    /// Name as written in source, without an `Attribute` suffix.
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.name.strip_suffix("Attribute").unwrap_or(&self.name)
    }
}

fn default_marker_name() -> String {
    "DoNotMockAttribute".to_string()
}

fn default_marker_namespace() -> String {
    "DoNotMock".to_string()
}

/// Syntactic category of a candidate construction site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    /// Direct construction, e.g. `new Mock<T>()`.
    Construction,
    /// Factory-style call, e.g. `Substitute.For<T>()`.
    Call,
}

impl std::fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Construction => write!(f, "construction"),
            Self::Call => write!(f, "call"),
        }
    }
}

/// A type argument at a candidate site, as far as the front end resolved it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeArgument {
    /// Resolved to a known type.
    Resolved(TypeRef),
    /// Could not be resolved; holds the source text.
    Unresolved(String),
}

/// A construction-like syntax node handed to the engine by a driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateNode {
    /// Construction or call.
    pub category: NodeCategory,
    /// Simple name of the constructed type or of the type owning the method.
    pub container: String,
    /// Namespace of `container`; `None` when the front end could not resolve it.
    pub namespace: Option<String>,
    /// Invoked method name for calls.
    pub method: Option<String>,
    /// Type arguments in source order.
    pub type_arguments: Vec<TypeArgument>,
    /// Span of the whole expression.
    pub location: Location,
}

impl CandidateNode {
    /// Creates a direct construction site.
    #[must_use]
    pub fn construction(container: impl Into<String>, location: Location) -> Self {
        Self {
            category: NodeCategory::Construction,
            container: container.into(),
            namespace: None,
            method: None,
            type_arguments: Vec::new(),
            location,
        }
    }

    /// Creates a factory-call site.
    #[must_use]
    pub fn call(
        container: impl Into<String>,
        method: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            category: NodeCategory::Call,
            container: container.into(),
            namespace: None,
            method: Some(method.into()),
            type_arguments: Vec::new(),
            location,
        }
    }

    /// Sets the resolved namespace of the container.
    #[must_use]
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Appends a type argument.
    #[must_use]
    pub fn with_type_argument(mut self, argument: TypeArgument) -> Self {
        self.type_arguments.push(argument);
        self
    }

    /// Appends a resolved type argument.
    #[must_use]
    pub fn with_subject(self, subject: TypeRef) -> Self {
        self.with_type_argument(TypeArgument::Resolved(subject))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn type_ref_equality_ignores_kind() {
        let a = TypeRef::class("Acme.Service");
        let b = TypeRef::interface("Acme.Service");
        assert_eq!(a, b);

        let set: HashSet<TypeRef> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn type_ref_splits_namespace() {
        let t = TypeRef::interface("Acme.Billing.IService");
        assert_eq!(t.name(), "IService");
        assert_eq!(t.namespace(), "Acme.Billing");

        let global = TypeRef::class("Program");
        assert_eq!(global.name(), "Program");
        assert_eq!(global.namespace(), "");
    }

    #[test]
    fn annotation_message_requires_non_empty_first_string() {
        let marker = Annotation::new("DoNotMockAttribute", "DoNotMock");
        assert_eq!(marker.message(), None);

        assert_eq!(marker.clone().with_message("").message(), None);
        assert_eq!(
            marker.clone().with_argument(AnnotationArg::Null).message(),
            None
        );
        assert_eq!(
            marker
                .clone()
                .with_argument(AnnotationArg::Other("42".into()))
                .with_message("ignored")
                .message(),
            None
        );
        assert_eq!(
            marker.with_message("Use TestDouble").message(),
            Some("Use TestDouble")
        );
    }

    #[test]
    fn marker_spec_matches_name_and_namespace() {
        let spec = MarkerSpec::default();
        assert_eq!(spec.short_name(), "DoNotMock");
        assert!(spec.matches(&Annotation::new("DoNotMockAttribute", "DoNotMock")));
        assert!(!spec.matches(&Annotation::new("DoNotMockAttribute", "Other")));
        assert!(!spec.matches(&Annotation::new("Obsolete", "DoNotMock")));
    }

    #[test]
    fn candidate_builder() {
        let node = CandidateNode::call("Substitute", "For", Location::new("a.cs", 1, 1))
            .in_namespace("NSubstitute")
            .with_subject(TypeRef::interface("Acme.IService"));
        assert_eq!(node.category, NodeCategory::Call);
        assert_eq!(node.method.as_deref(), Some("For"));
        assert_eq!(node.namespace.as_deref(), Some("NSubstitute"));
        assert_eq!(node.type_arguments.len(), 1);
    }
}
