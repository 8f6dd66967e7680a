//! Per-file syntax extracted from C# sources, before name binding.
//!
//! Everything here is plain data keyed by source text; resolving names to
//! declared or external types happens later, once every file of the
//! compilation has been read.

use donotmock_core::{AnnotationArg, Location, TypeKind};
use std::path::PathBuf;

/// A possibly qualified, possibly generic type or member name as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRef {
    /// Alias qualifier of `alias::Name` (including `global`).
    pub alias: Option<String>,
    /// Dotted identifiers, type arguments stripped.
    pub segments: Vec<String>,
    /// Type arguments of the last segment.
    pub type_args: Vec<TypeSyntax>,
    /// Source text.
    pub text: String,
}

impl NameRef {
    /// Creates a plain dotted name without type arguments.
    #[must_use]
    pub fn dotted(text: &str) -> Self {
        Self {
            alias: None,
            segments: text.split('.').map(str::to_string).collect(),
            type_args: Vec::new(),
            text: text.to_string(),
        }
    }

    /// Last identifier.
    #[must_use]
    pub fn last(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// Same name with `suffix` appended to the last segment.
    #[must_use]
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let mut name = self.clone();
        if let Some(last) = name.segments.last_mut() {
            last.push_str(suffix);
        }
        name.text.push_str(suffix);
        name
    }
}

/// A type as written in a base list or type-argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSyntax {
    /// A named type.
    Name(NameRef),
    /// Anything else (`int`, arrays, tuples, pointers), kept as text.
    Other(String),
}

impl TypeSyntax {
    /// Source text.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Name(name) => &name.text,
            Self::Other(text) => text,
        }
    }
}

/// A `using` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Import {
    /// `using N;`
    Namespace(NameRef),
    /// `using static T;`
    Static(NameRef),
    /// `using A = T;`
    Alias {
        /// Alias identifier.
        alias: String,
        /// Aliased namespace or type.
        target: NameRef,
    },
}

/// One namespace nesting level and the `using` directives declared in it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Level {
    /// Fully qualified namespace, empty for the compilation unit.
    pub namespace: String,
    /// Directives declared directly at this level.
    pub imports: Vec<Import>,
}

/// Namespace context of a declaration or site, outermost level first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    /// Nesting levels; index 0 is the compilation unit.
    pub levels: Vec<Level>,
}

impl Default for Scope {
    fn default() -> Self {
        Self {
            levels: vec![Level::default()],
        }
    }
}

impl Scope {
    /// Innermost namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.levels.last().map_or("", |level| level.namespace.as_str())
    }

    /// Scope for a nested `namespace A.B` declaration, one level per segment.
    #[must_use]
    pub fn enter(&self, name: &str) -> Self {
        let mut scope = self.clone();
        for segment in name.split('.') {
            let namespace = qualify(scope.namespace(), segment);
            scope.levels.push(Level {
                namespace,
                imports: Vec::new(),
            });
        }
        scope
    }

    /// Adds a directive to the innermost level.
    pub fn import(&mut self, import: Import) {
        if let Some(level) = self.levels.last_mut() {
            level.imports.push(import);
        }
    }
}

/// Kind of a type declaration as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    /// `class`
    Class,
    /// `interface`
    Interface,
    /// `struct`
    Struct,
    /// `record` / `record class`
    Record,
    /// `record struct`
    RecordStruct,
    /// `enum`
    Enum,
}

impl DeclKind {
    /// Type kind of the declared type.
    #[must_use]
    pub fn type_kind(self) -> TypeKind {
        match self {
            Self::Class | Self::Record => TypeKind::Class,
            Self::Interface => TypeKind::Interface,
            Self::Struct | Self::RecordStruct | Self::Enum => TypeKind::Value,
        }
    }

    /// Whether the first base-list entry may be a base class.
    #[must_use]
    pub fn has_base_class(self) -> bool {
        matches!(self, Self::Class | Self::Record)
    }
}

/// An attribute as written on a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSyntax {
    /// Attribute name, possibly without the `Attribute` suffix.
    pub name: NameRef,
    /// Positional arguments in order; named arguments are dropped.
    pub arguments: Vec<AnnotationArg>,
}

/// A type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    /// Simple name.
    pub name: String,
    /// Kind as written.
    pub kind: DeclKind,
    /// Fully qualified name, enclosing types included.
    pub qualified_name: String,
    /// Index into [`FileSyntax::scopes`].
    pub scope: usize,
    /// Qualified names of enclosing types, outermost first.
    pub enclosing: Vec<String>,
    /// Base-list entries in order.
    pub bases: Vec<TypeSyntax>,
    /// Attributes declared directly on this declaration.
    pub attributes: Vec<AttributeSyntax>,
    /// 1-indexed line of the declaration.
    pub line: usize,
}

/// What a construction-like site looks like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteKind {
    /// `new T<...>(...)`
    Creation {
        /// The constructed type.
        ty: NameRef,
    },
    /// `Target.Method<...>(...)` or `Method<...>(...)`
    Call {
        /// Receiver, when qualified.
        target: Option<NameRef>,
        /// Invoked method.
        method: String,
        /// Method type arguments.
        type_args: Vec<TypeSyntax>,
    },
}

/// A construction-like expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    /// Shape of the expression.
    pub kind: SiteKind,
    /// Span of the whole expression.
    pub location: Location,
    /// Index into [`FileSyntax::scopes`].
    pub scope: usize,
    /// Qualified names of enclosing types, outermost first.
    pub enclosing: Vec<String>,
}

/// Everything extracted from one file.
#[derive(Debug, Clone, Default)]
pub struct FileSyntax {
    /// Path relative to the analysis root.
    pub path: PathBuf,
    /// Distinct namespace scopes referenced by declarations and sites.
    pub scopes: Vec<Scope>,
    /// `global using` directives; they apply to every file.
    pub global_imports: Vec<Import>,
    /// Type declarations, nested ones included.
    pub types: Vec<TypeDecl>,
    /// Construction-like sites in source order.
    pub sites: Vec<Site>,
    /// First syntax error, if the file does not parse cleanly.
    pub error: Option<String>,
}

/// Joins a namespace or type with a member name.
#[must_use]
pub fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
