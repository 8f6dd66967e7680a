//! Name binding across all files of a compilation.
//!
//! Lookup order for a simple name follows C#: nested types of the enclosing
//! types (innermost first), then each namespace level from the innermost out,
//! checking types declared in that namespace before the `using` directives
//! declared at that level. `global using` directives join the outermost
//! level. Ambiguities resolve to the first hit instead of an error.

use crate::syntax::{qualify, DeclKind, FileSyntax, Import, NameRef, Scope, Site, SiteKind, TypeSyntax};
use donotmock_core::{
    Annotation, CandidateNode, ExternalTypes, TypeArgument, TypeEntry, TypeKind, TypeRef,
};
use std::collections::HashMap;

/// A type a name resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Resolved {
    /// Fully qualified name.
    pub qualified: String,
    /// Namespace the type lives in (enclosing types excluded).
    pub namespace: String,
    /// Simple name.
    pub name: String,
    /// Declared kind; `None` for external types.
    pub kind: Option<TypeKind>,
}

impl Resolved {
    fn type_ref(&self) -> TypeRef {
        let kind = self
            .kind
            .unwrap_or_else(|| kind_by_convention(&self.name));
        TypeRef::new(self.qualified.clone(), kind)
    }
}

#[derive(Debug, Clone)]
struct Declared {
    namespace: String,
    name: String,
    kind: DeclKind,
}

/// `I` followed by an uppercase letter reads as an interface.
pub(crate) fn kind_by_convention(name: &str) -> TypeKind {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some('I'), Some(second)) if second.is_uppercase() => TypeKind::Interface,
        _ => TypeKind::Class,
    }
}

/// Resolves names against every declaration of the compilation and the
/// external types.
pub(crate) struct Binder<'a> {
    declared: HashMap<String, Declared>,
    externals: &'a ExternalTypes,
    global_imports: Vec<Import>,
}

impl<'a> Binder<'a> {
    pub(crate) fn new(files: &[FileSyntax], externals: &'a ExternalTypes) -> Self {
        let mut declared = HashMap::new();
        let mut global_imports = Vec::new();
        for file in files {
            global_imports.extend(file.global_imports.iter().cloned());
            for decl in &file.types {
                declared
                    .entry(decl.qualified_name.clone())
                    .or_insert_with(|| Declared {
                        namespace: file.scopes[decl.scope].namespace().to_string(),
                        name: decl.name.clone(),
                        kind: decl.kind,
                    });
            }
        }
        Self {
            declared,
            externals,
            global_imports,
        }
    }

    /// Builds the hierarchy entries declared in `file`.
    pub(crate) fn type_entries(&self, file: &FileSyntax) -> Vec<TypeEntry> {
        file.types
            .iter()
            .map(|decl| {
                let scope = &file.scopes[decl.scope];
                let kind = self
                    .declared
                    .get(&decl.qualified_name)
                    .map_or(decl.kind, |d| d.kind);
                let mut entry =
                    TypeEntry::new(TypeRef::new(decl.qualified_name.clone(), kind.type_kind()));

                for (index, base) in decl.bases.iter().enumerate() {
                    let ty = self.type_ref(base, scope, &decl.enclosing);
                    if index == 0 && kind.has_base_class() && ty.kind() != TypeKind::Interface {
                        entry = entry.with_base(ty);
                    } else {
                        entry = entry.with_interface(ty);
                    }
                }

                for attribute in &decl.attributes {
                    let resolved = self.resolve_attribute(&attribute.name, scope, &decl.enclosing);
                    if let Some(resolved) = resolved {
                        let mut annotation = Annotation::new(resolved.name, resolved.namespace);
                        for argument in &attribute.arguments {
                            annotation = annotation.with_argument(argument.clone());
                        }
                        entry = entry.with_annotation(annotation);
                    }
                }
                entry
            })
            .collect()
    }

    /// Turns a site into a candidate node.
    pub(crate) fn candidate(&self, file: &FileSyntax, site: &Site) -> CandidateNode {
        let scope = &file.scopes[site.scope];
        let (node, resolved, type_args) = match &site.kind {
            SiteKind::Creation { ty } => {
                let node = CandidateNode::construction(ty.last(), site.location.clone());
                (node, self.resolve(ty, scope, &site.enclosing), &ty.type_args)
            }
            SiteKind::Call {
                target: Some(target),
                method,
                type_args,
            } => {
                let node = CandidateNode::call(target.last(), method, site.location.clone());
                (node, self.resolve(target, scope, &site.enclosing), type_args)
            }
            SiteKind::Call {
                target: None,
                method,
                type_args,
            } => match self.resolve_static_method(method, scope) {
                Some(owner) => {
                    let node = CandidateNode::call(&owner.name, method, site.location.clone());
                    (node, Some(owner), type_args)
                }
                None => {
                    let node = CandidateNode::call("", method, site.location.clone());
                    (node, None, type_args)
                }
            },
        };

        // Aliased receivers match under the name they resolve to.
        let mut node = match resolved {
            Some(container) => {
                let mut node = node.in_namespace(container.namespace);
                node.container = container.name;
                node
            }
            None => node,
        };
        for arg in type_args {
            node = node.with_type_argument(self.type_argument(arg, scope, &site.enclosing));
        }
        node
    }

    fn type_argument(&self, ty: &TypeSyntax, scope: &Scope, enclosing: &[String]) -> TypeArgument {
        match ty {
            TypeSyntax::Name(name) => self.resolve(name, scope, enclosing).map_or_else(
                || TypeArgument::Unresolved(name.text.clone()),
                |r| TypeArgument::Resolved(r.type_ref()),
            ),
            TypeSyntax::Other(text) => TypeArgument::Unresolved(text.clone()),
        }
    }

    /// A base-list entry; unresolved names keep their source text.
    fn type_ref(&self, ty: &TypeSyntax, scope: &Scope, enclosing: &[String]) -> TypeRef {
        match ty {
            TypeSyntax::Name(name) => self.resolve(name, scope, enclosing).map_or_else(
                || TypeRef::new(name.segments.join("."), kind_by_convention(name.last())),
                |r| r.type_ref(),
            ),
            TypeSyntax::Other(text) => TypeRef::new(text.clone(), TypeKind::Class),
        }
    }

    /// Attribute names try the `Attribute` suffix first.
    fn resolve_attribute(&self, name: &NameRef, scope: &Scope, enclosing: &[String]) -> Option<Resolved> {
        if !name.last().ends_with("Attribute") {
            if let Some(resolved) = self.resolve(&name.with_suffix("Attribute"), scope, enclosing) {
                return Some(resolved);
            }
        }
        self.resolve(name, scope, enclosing)
    }

    /// Finds the owner of an unqualified `Method<...>()` through `using static`.
    fn resolve_static_method(&self, method: &str, scope: &Scope) -> Option<Resolved> {
        for (index, level) in scope.levels.iter().enumerate().rev() {
            for import in self.level_imports(index, &level.imports) {
                if let Import::Static(target) = import {
                    let Some(owner) = self.resolve_absolute(target) else {
                        continue;
                    };
                    if self
                        .externals
                        .declares_method(&owner.namespace, &owner.name, method)
                    {
                        return Some(owner);
                    }
                }
            }
        }
        None
    }

    fn level_imports<'i>(&'i self, index: usize, imports: &'i [Import]) -> impl Iterator<Item = &'i Import> {
        let globals: &[Import] = if index == 0 { &self.global_imports } else { &[] };
        imports.iter().chain(globals)
    }

    /// Resolves a type name in context.
    pub(crate) fn resolve(&self, name: &NameRef, scope: &Scope, enclosing: &[String]) -> Option<Resolved> {
        if let Some(alias) = &name.alias {
            if alias == "global" {
                return self.resolve_absolute(name);
            }
            return self.resolve_alias(alias, &name.segments, scope);
        }

        let (first, rest) = name.segments.split_first()?;

        for outer in enclosing.iter().rev() {
            let candidate = qualify(outer, first);
            if self.declared.contains_key(&candidate) {
                return self.descend(candidate, rest);
            }
        }

        for (index, level) in scope.levels.iter().enumerate().rev() {
            let candidate = qualify(&level.namespace, first);
            if let Some(found) = self.lookup(&candidate) {
                return self.descend(found.qualified, rest);
            }
            if !rest.is_empty() {
                let mut segments = vec![candidate];
                segments.extend(rest.iter().cloned());
                if let Some(found) = self.resolve_segments(&segments) {
                    return Some(found);
                }
            }

            for import in self.level_imports(index, &level.imports) {
                let found = match import {
                    Import::Alias { alias, target } if alias == first => {
                        self.expand_alias(target, rest)
                    }
                    Import::Namespace(namespace) => self
                        .lookup(&qualify(&namespace.segments.join("."), first))
                        .and_then(|found| self.descend(found.qualified, rest)),
                    Import::Static(target) => self.resolve_absolute(target).and_then(|owner| {
                        let nested = qualify(&owner.qualified, first);
                        self.declared
                            .contains_key(&nested)
                            .then(|| self.descend(nested, rest))
                            .flatten()
                    }),
                    Import::Alias { .. } => None,
                };
                if found.is_some() {
                    return found;
                }
            }
        }

        None
    }

    fn resolve_alias(&self, alias: &str, segments: &[String], scope: &Scope) -> Option<Resolved> {
        for (index, level) in scope.levels.iter().enumerate().rev() {
            for import in self.level_imports(index, &level.imports) {
                if let Import::Alias { alias: name, target } = import {
                    if name == alias {
                        return self.expand_alias(target, segments);
                    }
                }
            }
        }
        None
    }

    /// `using A = X.Y;` then `A.Rest`: `X.Y` is a type or a namespace.
    fn expand_alias(&self, target: &NameRef, rest: &[String]) -> Option<Resolved> {
        if let Some(found) = self.resolve_absolute(target) {
            return self.descend(found.qualified, rest);
        }
        let mut segments = target.segments.clone();
        segments.extend(rest.iter().cloned());
        self.resolve_segments(&segments)
    }

    fn resolve_absolute(&self, name: &NameRef) -> Option<Resolved> {
        self.resolve_segments(&name.segments)
    }

    /// Longest type prefix of a fully qualified dotted name, then nested types.
    fn resolve_segments(&self, segments: &[String]) -> Option<Resolved> {
        for split in (1..=segments.len()).rev() {
            let prefix = segments[..split].join(".");
            if let Some(found) = self.lookup(&prefix) {
                return self.descend(found.qualified, &segments[split..]);
            }
        }
        None
    }

    fn descend(&self, mut qualified: String, rest: &[String]) -> Option<Resolved> {
        for segment in rest {
            qualified = qualify(&qualified, segment);
            if !self.declared.contains_key(&qualified) {
                return None;
            }
        }
        self.lookup(&qualified)
    }

    fn lookup(&self, qualified: &str) -> Option<Resolved> {
        if let Some(declared) = self.declared.get(qualified) {
            return Some(Resolved {
                qualified: qualified.to_string(),
                namespace: declared.namespace.clone(),
                name: declared.name.clone(),
                kind: Some(declared.kind.type_kind()),
            });
        }
        let (namespace, name) = qualified.rsplit_once('.').unwrap_or(("", qualified));
        self.externals.contains(namespace, name).then(|| Resolved {
            qualified: qualified.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
            kind: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::CSharpExtractor;
    use std::path::Path;

    fn parse(files: &[&str]) -> Vec<FileSyntax> {
        let extractor = CSharpExtractor::new();
        files
            .iter()
            .enumerate()
            .map(|(i, src)| {
                extractor
                    .extract(Path::new(&format!("File{i}.cs")), src)
                    .unwrap()
            })
            .collect()
    }

    fn externals() -> ExternalTypes {
        ExternalTypes::new()
            .with_type("Moq", "Mock")
            .with_method("NSubstitute", "Substitute", "For")
            .with_type("DoNotMock", "DoNotMockAttribute")
    }

    fn entry<'e>(entries: &'e [TypeEntry], name: &str) -> &'e TypeEntry {
        entries
            .iter()
            .find(|e| e.ty.qualified_name() == name)
            .unwrap_or_else(|| panic!("no entry for {name}"))
    }

    #[test]
    fn convention_for_unresolved_names() {
        assert_eq!(kind_by_convention("IService"), TypeKind::Interface);
        assert_eq!(kind_by_convention("Item"), TypeKind::Class);
        assert_eq!(kind_by_convention("I"), TypeKind::Class);
    }

    #[test]
    fn resolves_across_files_and_namespaces() {
        let files = parse(&[
            "namespace Acme.Core { public interface IBase { } }\n",
            "using Acme.Core;\nnamespace Acme.Services {\n  public interface IService : IBase { }\n}\n",
        ]);
        let externals = externals();
        let binder = Binder::new(&files, &externals);

        let entries = binder.type_entries(&files[1]);
        let service = entry(&entries, "Acme.Services.IService");
        let names: Vec<&str> = service.interfaces.iter().map(TypeRef::qualified_name).collect();
        assert_eq!(names, vec!["Acme.Core.IBase"]);
        assert!(service.base.is_none());
    }

    #[test]
    fn parent_namespace_types_are_visible() {
        let files = parse(&[
            "namespace Acme { interface IBase { } }\nnamespace Acme.Inner { class Service : IBase { } }\n",
        ]);
        let externals = externals();
        let binder = Binder::new(&files, &externals);
        let entries = binder.type_entries(&files[0]);
        let service = entry(&entries, "Acme.Inner.Service");
        assert_eq!(
            service.interfaces.first().map(TypeRef::qualified_name),
            Some("Acme.IBase")
        );
    }

    #[test]
    fn first_base_of_a_class_is_the_base_type() {
        let files = parse(&[
            "namespace N {\n  class ServiceBase { }\n  interface IService { }\n  \
             class Service : ServiceBase, IService { }\n  class Impl : IService { }\n  \
             class Legacy : Unknown.Base { }\n  class Other : IUnknown { }\n}\n",
        ]);
        let externals = externals();
        let binder = Binder::new(&files, &externals);
        let entries = binder.type_entries(&files[0]);

        let service = entry(&entries, "N.Service");
        assert_eq!(service.base.as_ref().map(TypeRef::qualified_name), Some("N.ServiceBase"));
        assert_eq!(service.interfaces.len(), 1);

        let implementation = entry(&entries, "N.Impl");
        assert!(implementation.base.is_none());
        assert_eq!(implementation.interfaces.len(), 1);

        let legacy = entry(&entries, "N.Legacy");
        assert_eq!(legacy.base.as_ref().map(TypeRef::qualified_name), Some("Unknown.Base"));

        let other = entry(&entries, "N.Other");
        assert!(other.base.is_none());
        assert_eq!(other.interfaces[0].qualified_name(), "IUnknown");
    }

    #[test]
    fn marker_attribute_with_and_without_suffix() {
        let files = parse(&[
            "using DoNotMock;\nnamespace N {\n  [DoNotMock(\"a\")] interface IA { }\n  \
             [DoNotMockAttribute(\"b\")] interface IB { }\n  \
             [global::DoNotMock.DoNotMock(\"c\")] interface IC { }\n  [Obsolete] interface ID { }\n}\n",
        ]);
        let externals = externals();
        let binder = Binder::new(&files, &externals);
        let entries = binder.type_entries(&files[0]);

        for (name, message) in [("N.IA", "a"), ("N.IB", "b"), ("N.IC", "c")] {
            let annotations = &entry(&entries, name).annotations;
            assert_eq!(annotations.len(), 1, "{name}");
            assert_eq!(annotations[0].name, "DoNotMockAttribute");
            assert_eq!(annotations[0].namespace, "DoNotMock");
            assert_eq!(annotations[0].message(), Some(message));
        }
        assert!(entry(&entries, "N.ID").annotations.is_empty());
    }

    #[test]
    fn marker_without_using_is_not_resolved() {
        let files = parse(&["[DoNotMock(\"a\")] interface IA { }\n"]);
        let externals = externals();
        let binder = Binder::new(&files, &externals);
        assert!(binder.type_entries(&files[0])[0].annotations.is_empty());
    }

    #[test]
    fn candidates_resolve_container_and_subject() {
        let files = parse(&[
            "using Moq;\nusing NSubstitute;\nnamespace N {\n  interface IService { }\n  class T {\n    \
             void M() {\n      new Mock<IService>();\n      Substitute.For<IService>();\n      \
             new Mock<IMissing>();\n    }\n  }\n}\n",
        ]);
        let externals = externals();
        let binder = Binder::new(&files, &externals);
        let nodes: Vec<CandidateNode> = files[0]
            .sites
            .iter()
            .map(|site| binder.candidate(&files[0], site))
            .collect();
        assert_eq!(nodes.len(), 3);

        assert_eq!(nodes[0].namespace.as_deref(), Some("Moq"));
        assert_eq!(nodes[0].container, "Mock");
        assert_eq!(
            nodes[0].type_arguments,
            vec![TypeArgument::Resolved(TypeRef::interface("N.IService"))]
        );

        assert_eq!(nodes[1].namespace.as_deref(), Some("NSubstitute"));
        assert_eq!(nodes[1].method.as_deref(), Some("For"));

        assert_eq!(
            nodes[2].type_arguments,
            vec![TypeArgument::Unresolved("IMissing".into())]
        );
    }

    #[test]
    fn container_without_using_is_unresolved() {
        let files = parse(&["class T { object M() => new Mock<T>(); }\n"]);
        let externals = externals();
        let binder = Binder::new(&files, &externals);
        let node = binder.candidate(&files[0], &files[0].sites[0]);
        assert!(node.namespace.is_none());
    }

    #[test]
    fn aliases_static_and_global_usings() {
        let files = parse(&[
            "global using Moq;\n",
            "using Subs = NSubstitute.Substitute;\nusing static NSubstitute.Substitute;\n\
             using M = Moq;\ninterface IService { }\nclass T {\n  void F() {\n    \
             new Mock<IService>();\n    Subs.For<IService>();\n    For<IService>();\n    \
             new M.Mock<IService>();\n    new global::Moq.Mock<IService>();\n  }\n}\n",
        ]);
        let externals = externals();
        let binder = Binder::new(&files, &externals);
        let nodes: Vec<CandidateNode> = files[1]
            .sites
            .iter()
            .map(|site| binder.candidate(&files[1], site))
            .collect();
        assert_eq!(nodes.len(), 5);

        assert_eq!(nodes[0].namespace.as_deref(), Some("Moq"));
        assert_eq!(nodes[1].namespace.as_deref(), Some("NSubstitute"));
        assert_eq!(nodes[1].container, "Substitute");
        assert_eq!(nodes[2].namespace.as_deref(), Some("NSubstitute"));
        assert_eq!(nodes[2].container, "Substitute");
        assert_eq!(nodes[3].namespace.as_deref(), Some("Moq"));
        assert_eq!(nodes[4].namespace.as_deref(), Some("Moq"));
    }

    #[test]
    fn nested_types_resolve_from_inside_and_outside() {
        let files = parse(&[
            "namespace N {\n  class Outer {\n    public interface IInner { }\n    \
             object A() => new Moq.Mock<IInner>();\n  }\n  class Other {\n    \
             object B() => new Moq.Mock<Outer.IInner>();\n  }\n}\n",
        ]);
        let externals = externals();
        let binder = Binder::new(&files, &externals);
        let subjects: Vec<TypeArgument> = files[0]
            .sites
            .iter()
            .map(|site| binder.candidate(&files[0], site).type_arguments[0].clone())
            .collect();
        let expected = TypeArgument::Resolved(TypeRef::interface("N.Outer.IInner"));
        assert_eq!(subjects, vec![expected.clone(), expected]);
    }
}
