//! Type/hierarchy provider seam and its in-memory implementation.

use crate::model::{Annotation, TypeRef};
use std::collections::HashMap;

/// Read-only view of type ancestry and directly declared markers.
///
/// Implemented by the host front end. Unknown types have no base type, no
/// interfaces and no annotations.
pub trait TypeHierarchy: Send + Sync {
    /// Direct base type, if any.
    fn base_type(&self, ty: &TypeRef) -> Option<&TypeRef>;

    /// Directly implemented interfaces in declaration order.
    fn interfaces(&self, ty: &TypeRef) -> &[TypeRef];

    /// Annotations declared on the type itself (never inherited ones).
    fn annotations(&self, ty: &TypeRef) -> &[Annotation];
}

/// Everything known about one declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEntry {
    /// The type itself.
    pub ty: TypeRef,
    /// Direct base type.
    pub base: Option<TypeRef>,
    /// Directly implemented interfaces, in declaration order.
    pub interfaces: Vec<TypeRef>,
    /// Directly declared annotations.
    pub annotations: Vec<Annotation>,
}

impl TypeEntry {
    /// Creates an entry with no ancestors and no annotations.
    #[must_use]
    pub fn new(ty: TypeRef) -> Self {
        Self {
            ty,
            base: None,
            interfaces: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Sets the base type.
    #[must_use]
    pub fn with_base(mut self, base: TypeRef) -> Self {
        self.base = Some(base);
        self
    }

    /// Appends an implemented interface.
    #[must_use]
    pub fn with_interface(mut self, interface: TypeRef) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Appends an annotation.
    #[must_use]
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Folds another declaration of the same type (a partial part) into this one.
    pub fn merge(&mut self, other: Self) {
        if self.base.is_none() {
            self.base = other.base;
        }
        for interface in other.interfaces {
            if !self.interfaces.contains(&interface) {
                self.interfaces.push(interface);
            }
        }
        self.annotations.extend(other.annotations);
    }
}

/// In-memory [`TypeHierarchy`] keyed by qualified name.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    entries: HashMap<String, TypeEntry>,
}

impl TypeTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a declaration, merging with an existing entry of the same name.
    pub fn insert(&mut self, entry: TypeEntry) {
        match self.entries.get_mut(entry.ty.qualified_name()) {
            Some(existing) => existing.merge(entry),
            None => {
                self.entries
                    .insert(entry.ty.qualified_name().to_string(), entry);
            }
        }
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, entry: TypeEntry) -> Self {
        self.insert(entry);
        self
    }

    /// Looks up an entry by qualified name.
    #[must_use]
    pub fn get(&self, qualified_name: &str) -> Option<&TypeEntry> {
        self.entries.get(qualified_name)
    }

    /// Whether a type with this qualified name is declared.
    #[must_use]
    pub fn contains(&self, qualified_name: &str) -> bool {
        self.entries.contains_key(qualified_name)
    }

    /// Number of declared types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates all entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeEntry> {
        self.entries.values()
    }
}

impl TypeHierarchy for TypeTable {
    fn base_type(&self, ty: &TypeRef) -> Option<&TypeRef> {
        self.get(ty.qualified_name())
            .and_then(|entry| entry.base.as_ref())
    }

    fn interfaces(&self, ty: &TypeRef) -> &[TypeRef] {
        self.get(ty.qualified_name())
            .map(|entry| entry.interfaces.as_slice())
            .unwrap_or_default()
    }

    fn annotations(&self, ty: &TypeRef) -> &[Annotation] {
        self.get(ty.qualified_name())
            .map(|entry| entry.annotations.as_slice())
            .unwrap_or_default()
    }
}
