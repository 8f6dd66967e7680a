//! Language front-end seam.
//!
//! A front end turns source files into the two inputs the engine needs: a
//! type table for the hierarchy walk and the list of construction-like sites.

use crate::hierarchy::TypeTable;
use crate::model::{CandidateNode, MarkerSpec};
use crate::registry::SignatureRegistry;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use thiserror::Error;

/// A source file handed to a front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path as reported in diagnostics (relative to the analysis root).
    pub path: PathBuf,
    /// File contents.
    pub content: String,
}

impl SourceFile {
    /// Creates a source file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// A file the front end could not use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    /// Path of the file.
    pub path: PathBuf,
    /// Why it was skipped.
    pub reason: String,
}

/// Output of compiling a set of sources.
#[derive(Debug, Clone, Default)]
pub struct Compilation {
    /// Every type declared in the sources.
    pub types: TypeTable,
    /// Construction-like sites in source order per file.
    pub candidates: Vec<CandidateNode>,
    /// Files that failed to parse and contributed nothing.
    pub skipped: Vec<SkippedFile>,
    /// Files with syntax errors whose well-formed parts were still compiled.
    pub recovered: Vec<SkippedFile>,
}

/// Types that exist outside the analyzed sources.
///
/// Front ends resolve names against these in addition to source
/// declarations: the containers and factory methods of every registered
/// signature, and the marker type itself.
#[derive(Debug, Clone, Default)]
pub struct ExternalTypes {
    types: HashSet<(String, String)>,
    methods: HashMap<(String, String), HashSet<String>>,
}

impl ExternalTypes {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the external types a registry and marker refer to.
    #[must_use]
    pub fn from_registry(registry: &SignatureRegistry, marker: &MarkerSpec) -> Self {
        let mut externals = Self::new().with_type(&marker.namespace, &marker.name);
        for signature in registry.iter() {
            externals = externals.with_type(&signature.namespace, &signature.container);
            if let Some(method) = &signature.method {
                externals = externals.with_method(&signature.namespace, &signature.container, method);
            }
        }
        externals
    }

    /// Adds a type.
    #[must_use]
    pub fn with_type(mut self, namespace: &str, name: &str) -> Self {
        self.types.insert((namespace.to_string(), name.to_string()));
        self
    }

    /// Adds a static method on a type, adding the type as well.
    #[must_use]
    pub fn with_method(mut self, namespace: &str, container: &str, method: &str) -> Self {
        self.types
            .insert((namespace.to_string(), container.to_string()));
        self.methods
            .entry((namespace.to_string(), container.to_string()))
            .or_default()
            .insert(method.to_string());
        self
    }

    /// Whether `namespace.name` is a known external type.
    #[must_use]
    pub fn contains(&self, namespace: &str, name: &str) -> bool {
        self.types
            .contains(&(namespace.to_string(), name.to_string()))
    }

    /// Whether `namespace.container` declares a static method `method`.
    #[must_use]
    pub fn declares_method(&self, namespace: &str, container: &str, method: &str) -> bool {
        self.methods
            .get(&(namespace.to_string(), container.to_string()))
            .is_some_and(|methods| methods.contains(method))
    }
}

/// Errors raised by a front end as a whole (per-file parse failures are
/// reported through [`Compilation::skipped`] and [`Compilation::recovered`]).
#[derive(Debug, Error)]
pub enum FrontEndError {
    /// The language grammar could not be loaded.
    #[error("Failed to load language: {0}")]
    Language(String),

    /// A file could not be parsed at all.
    #[error("Parse error in {path}: {message}")]
    Parse {
        /// Path of the file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
}

/// A language front end.
pub trait FrontEnd: Send + Sync {
    /// Language identifier (e.g., `csharp`).
    fn language_id(&self) -> &'static str;

    /// File extensions handled, including the leading dot (e.g., `.cs`).
    fn extensions(&self) -> &'static [&'static str];

    /// Parses and binds the sources.
    ///
    /// # Errors
    ///
    /// Returns an error only when the front end cannot run at all.
    fn compile(
        &self,
        sources: &[SourceFile],
        externals: &ExternalTypes,
    ) -> Result<Compilation, FrontEndError>;
}
