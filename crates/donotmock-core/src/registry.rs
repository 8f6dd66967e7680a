//! Table of known mock-construction API shapes.
//!
//! Recognizing "this expression creates a mock" is pure data: each supported
//! library contributes rows, and lookup dispatches on a
//! `(category, container, namespace, method)` key.

use crate::model::{CandidateNode, NodeCategory, TypeArgument, TypeRef};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

/// Arity shared by every shipped signature.
pub const MOCK_ARITY: usize = 1;

/// Which type argument of a matched site is the mocked subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum SubjectRule {
    /// The type argument at the given position.
    TypeArgument(usize),
}

impl SubjectRule {
    fn extract<'n>(self, arguments: &'n [TypeArgument]) -> Option<&'n TypeArgument> {
        match self {
            Self::TypeArgument(index) => arguments.get(index),
        }
    }

    /// Position of the subject among the type arguments.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::TypeArgument(index) => index,
        }
    }
}

/// One recognizable mock-creation shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstructionSignature {
    /// Library label (e.g., "Moq").
    pub library: String,
    /// Construction or call.
    pub category: NodeCategory,
    /// Constructed type, or type owning the factory method.
    pub container: String,
    /// Namespace of `container`.
    pub namespace: String,
    /// Factory method for call signatures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Required number of type arguments.
    pub arity: usize,
    /// Which type argument is the mocked subject.
    pub subject: SubjectRule,
}

impl ConstructionSignature {
    /// Creates a direct-construction signature (`new Container<T>()`).
    #[must_use]
    pub fn construction(
        library: impl Into<String>,
        container: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            library: library.into(),
            category: NodeCategory::Construction,
            container: container.into(),
            namespace: namespace.into(),
            method: None,
            arity: MOCK_ARITY,
            subject: SubjectRule::TypeArgument(0),
        }
    }

    /// Creates a factory-call signature (`Container.Method<T>()`).
    #[must_use]
    pub fn call(
        library: impl Into<String>,
        container: impl Into<String>,
        method: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            library: library.into(),
            category: NodeCategory::Call,
            container: container.into(),
            namespace: namespace.into(),
            method: Some(method.into()),
            arity: MOCK_ARITY,
            subject: SubjectRule::TypeArgument(0),
        }
    }

    /// Overrides arity and subject position.
    #[must_use]
    pub fn with_arity(mut self, arity: usize, subject_index: usize) -> Self {
        self.arity = arity;
        self.subject = SubjectRule::TypeArgument(subject_index);
        self
    }

    /// The lookup key for this signature.
    #[must_use]
    pub fn key(&self) -> SignatureKey {
        SignatureKey {
            category: self.category,
            container: self.container.clone(),
            namespace: self.namespace.clone(),
            method: self.method.clone(),
        }
    }

    /// `Namespace.Container[.Method]` for display.
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut name = if self.namespace.is_empty() {
            self.container.clone()
        } else {
            format!("{}.{}", self.namespace, self.container)
        };
        if let Some(method) = &self.method {
            name.push('.');
            name.push_str(method);
        }
        name
    }
}

/// Direct-dispatch key of a signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureKey {
    category: NodeCategory,
    container: String,
    namespace: String,
    method: Option<String>,
}

/// A successful match of a candidate node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureMatch<'r> {
    /// The matched signature.
    pub signature: &'r ConstructionSignature,
    /// The type being mocked.
    pub subject: TypeRef,
}

/// Detailed outcome of matching a candidate node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome<'r> {
    /// A known shape with a resolved subject.
    Matched(SignatureMatch<'r>),
    /// No registered signature has this key.
    NonMatch,
    /// The key matched but the type-argument count differs.
    ArityMismatch {
        /// Arity the signature requires.
        expected: usize,
        /// Arity found at the site.
        found: usize,
    },
    /// The host could not resolve the container or the subject.
    Unresolved(String),
}

/// Errors raised while assembling a registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Two signatures share the same lookup key.
    #[error("duplicate signature {0}")]
    Duplicate(String),

    /// The subject index does not address a type argument.
    #[error("signature {name}: subject index {index} is out of range for arity {arity}")]
    InvalidSubject {
        /// Signature display name.
        name: String,
        /// Configured subject index.
        index: usize,
        /// Configured arity.
        arity: usize,
    },

    /// A call signature without a method, or a construction with one.
    #[error("signature {0}: method is required for calls and not allowed for constructions")]
    MethodMismatch(String),
}

struct BuiltinSignature {
    library: &'static str,
    category: NodeCategory,
    container: &'static str,
    namespace: &'static str,
    method: Option<&'static str>,
}

const BUILTIN_SIGNATURES: &[BuiltinSignature] = &[
    BuiltinSignature {
        library: "Moq",
        category: NodeCategory::Construction,
        container: "Mock",
        namespace: "Moq",
        method: None,
    },
    BuiltinSignature {
        library: "Moq",
        category: NodeCategory::Call,
        container: "Mock",
        namespace: "Moq",
        method: Some("Of"),
    },
    BuiltinSignature {
        library: "NSubstitute",
        category: NodeCategory::Call,
        container: "Substitute",
        namespace: "NSubstitute",
        method: Some("For"),
    },
    BuiltinSignature {
        library: "NSubstitute",
        category: NodeCategory::Call,
        container: "Substitute",
        namespace: "NSubstitute",
        method: Some("ForPartsOf"),
    },
    BuiltinSignature {
        library: "FakeItEasy",
        category: NodeCategory::Call,
        container: "A",
        namespace: "FakeItEasy",
        method: Some("Fake"),
    },
    BuiltinSignature {
        library: "FakeItEasy",
        category: NodeCategory::Construction,
        container: "Fake",
        namespace: "FakeItEasy",
        method: None,
    },
    BuiltinSignature {
        library: "JustMock",
        category: NodeCategory::Call,
        container: "Mock",
        namespace: "Telerik.JustMock",
        method: Some("Create"),
    },
    BuiltinSignature {
        library: "Rhino Mocks",
        category: NodeCategory::Call,
        container: "MockRepository",
        namespace: "Rhino.Mocks",
        method: Some("GenerateMock"),
    },
    BuiltinSignature {
        library: "Rhino Mocks",
        category: NodeCategory::Call,
        container: "MockRepository",
        namespace: "Rhino.Mocks",
        method: Some("GenerateStub"),
    },
];

impl BuiltinSignature {
    fn to_signature(&self) -> ConstructionSignature {
        ConstructionSignature {
            library: self.library.to_string(),
            category: self.category,
            container: self.container.to_string(),
            namespace: self.namespace.to_string(),
            method: self.method.map(str::to_string),
            arity: MOCK_ARITY,
            subject: SubjectRule::TypeArgument(0),
        }
    }
}

/// Builder for a [`SignatureRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    signatures: Vec<ConstructionSignature>,
}

impl RegistryBuilder {
    /// Adds the built-in signatures.
    #[must_use]
    pub fn builtins(self) -> Self {
        self.rows(BUILTIN_SIGNATURES)
    }

    fn rows(mut self, rows: &[BuiltinSignature]) -> Self {
        self.signatures.extend(rows.iter().map(BuiltinSignature::to_signature));
        self
    }

    /// Adds one signature.
    #[must_use]
    pub fn signature(mut self, signature: ConstructionSignature) -> Self {
        self.signatures.push(signature);
        self
    }

    /// Adds several signatures.
    #[must_use]
    pub fn signatures<I>(mut self, signatures: I) -> Self
    where
        I: IntoIterator<Item = ConstructionSignature>,
    {
        self.signatures.extend(signatures);
        self
    }

    /// Validates the rows and builds the lookup table.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate keys or malformed rows.
    pub fn build(self) -> Result<SignatureRegistry, RegistryError> {
        let mut by_key = HashMap::with_capacity(self.signatures.len());
        let mut order = Vec::with_capacity(self.signatures.len());

        for signature in self.signatures {
            let name = signature.display_name();
            let has_method = signature.method.is_some();
            if has_method != (signature.category == NodeCategory::Call) {
                return Err(RegistryError::MethodMismatch(name));
            }
            if signature.subject.index() >= signature.arity {
                return Err(RegistryError::InvalidSubject {
                    name,
                    index: signature.subject.index(),
                    arity: signature.arity,
                });
            }

            let key = signature.key();
            if by_key.contains_key(&key) {
                return Err(RegistryError::Duplicate(name));
            }
            order.push(key.clone());
            by_key.insert(key, signature);
        }

        Ok(SignatureRegistry { by_key, order })
    }
}

/// Immutable lookup table of construction signatures.
#[derive(Debug, Clone, Default)]
pub struct SignatureRegistry {
    by_key: HashMap<SignatureKey, ConstructionSignature>,
    order: Vec<SignatureKey>,
}

impl SignatureRegistry {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registry containing only the built-in signatures.
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in table is malformed.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::builder().builtins().build()
    }

    /// Number of registered signatures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Signatures in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ConstructionSignature> {
        self.order.iter().filter_map(|key| self.by_key.get(key))
    }

    /// Matches a candidate node, returning the signature and subject type.
    #[must_use]
    pub fn match_node(&self, node: &CandidateNode) -> Option<SignatureMatch<'_>> {
        match self.classify(node) {
            MatchOutcome::Matched(found) => Some(found),
            MatchOutcome::NonMatch
            | MatchOutcome::ArityMismatch { .. }
            | MatchOutcome::Unresolved(_) => None,
        }
    }

    /// Classifies a candidate node against the table.
    #[must_use]
    pub fn classify(&self, node: &CandidateNode) -> MatchOutcome<'_> {
        let Some(namespace) = &node.namespace else {
            return MatchOutcome::Unresolved(format!("container '{}'", node.container));
        };

        let key = SignatureKey {
            category: node.category,
            container: node.container.clone(),
            namespace: namespace.clone(),
            method: node.method.clone(),
        };
        let Some(signature) = self.by_key.get(&key) else {
            return MatchOutcome::NonMatch;
        };

        if node.type_arguments.len() != signature.arity {
            return MatchOutcome::ArityMismatch {
                expected: signature.arity,
                found: node.type_arguments.len(),
            };
        }

        match signature.subject.extract(&node.type_arguments) {
            Some(TypeArgument::Resolved(subject)) => MatchOutcome::Matched(SignatureMatch {
                signature,
                subject: subject.clone(),
            }),
            Some(TypeArgument::Unresolved(text)) => {
                MatchOutcome::Unresolved(format!("subject type '{text}'"))
            }
            None => MatchOutcome::NonMatch,
        }
    }
}
